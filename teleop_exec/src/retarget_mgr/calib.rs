//! Arm calibration
//!
//! Calibration deterministically zeroes an arm chain at a known pose. For
//! every joint the current source reading is captured as the new neutral,
//! the mapping offset is rewritten so the (now zero) post-calibration
//! reading maps exactly onto the desired angle, and the channel is locked
//! at that angle for a hold duration.
//!
//! The lock exists because the smoothing and rate-limit stages would
//! otherwise slew slowly toward the new offset, producing a visible settle
//! after calibration; locking forces an instantaneous deterministic snap.
//! The hold is tracked as an explicit expiry time checked each cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::calc_single_joint::source_angle_deg;
use super::*;
use comms_if::eqpt::ArmSide;
use log::info;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RetargetMgr {
    /// Calibrate one arm.
    ///
    /// `targets_deg` and `hold_s` override the configured calibration
    /// targets and hold duration when given.
    pub(crate) fn calibrate(
        &mut self,
        side: ArmSide,
        targets_deg: Option<&[f64]>,
        hold_s: Option<f64>,
        input_data: &InputData,
    ) -> Result<(), RetargetMgrError> {
        let params = &self.params;

        let targets_deg = targets_deg.unwrap_or(&params.calib_targets_deg);
        let hold_s = hold_s.unwrap_or(params.calib_hold_s);

        let arm = &mut self.arms[side.index()];

        if targets_deg.len() != arm.channels.len() {
            return Err(RetargetMgrError::InvalidCalibTargets {
                expected: arm.channels.len(),
                got: targets_deg.len(),
            });
        }

        for (joint_idx, channel) in arm.channels.iter_mut().enumerate() {
            // Capture the current source reading as the new neutral, so all
            // subsequent raw readings become deltas from this pose. A joint
            // with no sample this cycle keeps its previous neutral.
            if let Some(raw_deg) = source_angle_deg(input_data.pose.as_ref(), channel.binding()) {
                channel.capture_neutral(raw_deg);
            }

            // With the post-calibration reading at zero the mapped value is
            // exactly the offset, so the offset becomes the desired target
            channel.set_offset_deg(targets_deg[joint_idx]);

            // Snap and hold
            channel.lock_at(targets_deg[joint_idx]);
        }

        arm.lock_until_s = Some(input_data.time_s + hold_s);

        info!(
            "{:?} arm calibrated, holding at {:?} deg for {} s",
            side, targets_deg, hold_s
        );

        Ok(())
    }

    /// Release the calibration hold on any arm whose hold duration has
    /// expired, returning control to whatever mode is active.
    pub(crate) fn release_expired_locks(&mut self, time_s: f64) {
        for arm in self.arms.iter_mut() {
            if let Some(lock_until_s) = arm.lock_until_s {
                if time_s >= lock_until_s {
                    for channel in arm.channels.iter_mut() {
                        channel.unlock();
                    }

                    arm.lock_until_s = None;

                    info!("{:?} arm calibration hold released", arm.side);
                }
            }
        }
    }
}
