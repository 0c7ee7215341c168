//! IK target calculations
//!
//! Maps the operator's wrist position onto a robot-frame IK target: the
//! wrist-minus-shoulder vector is scaled by the configured reach ratio,
//! taken into the robot base frame, optionally clamped to a box, offset for
//! the end-effector, taken back to world space and finally smoothed toward
//! the previous target to suppress tracking jitter.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;

// Internal imports
use super::{ArmChain, Params};
use comms_if::eqpt::pose::TrackedPose;
use util::maths::{clamp, clamp01};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmChain {
    /// Compute the smoothed IK target for this arm, or `None` if the pose
    /// sample carries no anchors for it this cycle.
    ///
    /// Mutates the arm's smoothing state.
    pub(crate) fn compute_ik_target(
        &mut self,
        pose: Option<&TrackedPose>,
        params: &Params,
    ) -> Option<Vector3<f64>> {
        let anchors = pose?.anchors(self.side)?;

        // Operator arm vector scaled into robot reach
        let reach_m = (anchors.wrist_m - anchors.shoulder_m) * params.arm_scale;

        // Into the robot base frame
        let mut local_m = self.model.base_rot().inverse_transform_vector(&reach_m);

        // Optional position constraint box
        if let (Some(min_m), Some(max_m)) = (params.target_clamp_min_m, params.target_clamp_max_m)
        {
            for axis in 0..3 {
                local_m[axis] = clamp(&local_m[axis], &min_m[axis], &max_m[axis]);
            }
        }

        // Fixed end-effector offset
        local_m += Vector3::from(params.effector_offset_m);

        // Back to world space
        let world_m = self.model.base_pos_m() + self.model.base_rot() * local_m;

        // Exponential smoothing toward the previous target
        let target_m = match self.smoothed_target_m {
            Some(previous_m) => previous_m.lerp(&world_m, clamp01(params.target_smooth_alpha)),
            None => world_m,
        };

        self.smoothed_target_m = Some(target_m);

        Some(target_m)
    }
}
