//! Single-joint mode calculations
//!
//! In SingleJoint mode every channel follows its bound source orientation
//! through the per-joint filtering pipeline. There is no coupling between
//! joints: a missing source only skips that one channel for the cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use crate::joint_retarget::{EulerAxis, SourceBinding};
use comms_if::eqpt::drive::DriveDems;
use comms_if::eqpt::pose::TrackedPose;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RetargetMgr {
    /// Perform the single-joint mode calculations.
    ///
    /// Runs the filtering pipeline for every channel in both chains,
    /// inserting one drive demand per channel that produced a target. A
    /// locked channel demands its locked target regardless of its source.
    pub(crate) fn calc_single_joint(&mut self, input_data: &InputData, dems: &mut DriveDems) {
        let report = &mut self.report;

        for (arm_idx, arm) in self.arms.iter_mut().enumerate() {
            for (joint_idx, channel) in arm.channels.iter_mut().enumerate() {
                let raw_deg = source_angle_deg(input_data.pose.as_ref(), channel.binding());

                // A missing source or binding is a silent no-op for this
                // channel only, unless the channel is locked, in which case
                // it must still demand its locked target
                let raw_deg = match (raw_deg, channel.is_locked()) {
                    (Some(raw), _) => raw,
                    (None, true) => 0.0,
                    (None, false) => continue,
                };

                let (target_deg, flags) = channel.apply(raw_deg, input_data.dt_s);

                report.dead_hold[arm_idx][joint_idx] = flags.dead_hold;
                report.soft_limited[arm_idx][joint_idx] = flags.soft_limited;
                report.rate_limited[arm_idx][joint_idx] = flags.rate_limited;
                report.abs_pos_limited[arm_idx][joint_idx] = flags.abs_pos_limited;

                dems.joints
                    .insert(channel.id(), channel.demand(target_deg));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Extract the bound Euler component of a tracked source orientation as a
/// signed angle in degrees.
///
/// Returns `None` if there is no pose this cycle, the channel has no
/// binding, or the tracker has no sample for the bound source joint.
pub(crate) fn source_angle_deg(
    pose: Option<&TrackedPose>,
    binding: Option<&SourceBinding>,
) -> Option<f64> {
    let pose = pose?;
    let binding = binding?;

    let orientation = pose.orientation(binding.source)?;
    let (roll_rad, pitch_rad, yaw_rad) = orientation.euler_angles();

    let angle_rad = match binding.axis {
        EulerAxis::Roll => roll_rad,
        EulerAxis::Pitch => pitch_rad,
        EulerAxis::Yaw => yaw_rad,
    };

    Some(angle_rad.to_degrees() * binding.sign)
}
