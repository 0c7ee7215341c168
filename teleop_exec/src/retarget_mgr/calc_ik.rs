//! IK mode calculations
//!
//! In IK mode each arm's smoothed wrist target is solved by the CCD solver,
//! warm-started from the currently commanded angles, and the solution is
//! pushed directly to the drives, bypassing the filtering pipeline.
//!
//! If the solver cannot produce even a partial success the arm's demands
//! are simply not updated this cycle: the previous drive targets remain in
//! force and the arm is never zeroed or snapped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use crate::chain_ik;
use comms_if::eqpt::drive::DriveDems;
use log::debug;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RetargetMgr {
    /// Perform the IK mode calculations.
    pub(crate) fn calc_ik(&mut self, input_data: &InputData, dems: &mut DriveDems) {
        let params = &self.params;
        let report = &mut self.report;

        for (arm_idx, arm) in self.arms.iter_mut().enumerate() {
            // A missing arm anchor set is a silent no-op for that arm
            let target_m = match arm.compute_ik_target(input_data.pose.as_ref(), params) {
                Some(t) => t,
                None => {
                    report.ik_skipped[arm_idx] = true;
                    arm.demand_locked(dems);
                    continue;
                }
            };

            // Warm start from the currently commanded angles for pose
            // continuity
            let seed_deg: Vec<f64> = arm.channels.iter().map(|c| c.last_cmd_deg()).collect();

            let solution = chain_ik::solve(&arm.model, &target_m, &seed_deg, &params.ik);

            report.ik_residual_m[arm_idx] = solution.residual_m;
            report.ik_converged[arm_idx] = solution.converged;

            if !solution.converged {
                // Hold the previous pose rather than act on a bad solution
                report.ik_skipped[arm_idx] = true;
                debug!(
                    "IK for {:?} arm did not converge (residual {:.4} m), holding previous pose",
                    arm.side, solution.residual_m
                );
                arm.demand_locked(dems);
                continue;
            }

            for (joint_idx, channel) in arm.channels.iter_mut().enumerate() {
                let target_deg = channel.set_target_direct(solution.angles_deg[joint_idx]);
                dems.joints
                    .insert(channel.id(), channel.demand(target_deg));
            }
        }
    }
}
