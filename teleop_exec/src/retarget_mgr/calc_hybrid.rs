//! Hybrid mode calculations
//!
//! Hybrid mode splits each arm at the configured index: the base-side
//! (shoulder and elbow) joints take the IK solution directly while the
//! wrist joints keep following their source orientations through the
//! filtering pipeline. Wrist orientation is normally driven by the
//! operator's hand orientation rather than position IK.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::calc_single_joint::source_angle_deg;
use super::*;
use crate::chain_ik;
use comms_if::eqpt::drive::DriveDems;
use log::debug;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RetargetMgr {
    /// Perform the hybrid mode calculations.
    ///
    /// An IK failure only holds the base-side group; the wrist group runs
    /// its pipeline independently either way.
    pub(crate) fn calc_hybrid(&mut self, input_data: &InputData, dems: &mut DriveDems) {
        let params = &self.params;
        let report = &mut self.report;
        let split = params.hybrid_split_index;

        for (arm_idx, arm) in self.arms.iter_mut().enumerate() {
            // ---- IK GROUP ----

            let target_m = arm.compute_ik_target(input_data.pose.as_ref(), params);

            let solution = match target_m {
                Some(t) => {
                    let seed_deg: Vec<f64> =
                        arm.channels.iter().map(|c| c.last_cmd_deg()).collect();
                    Some(chain_ik::solve(&arm.model, &t, &seed_deg, &params.ik))
                }
                None => None,
            };

            match solution {
                Some(ref sol) if sol.converged => {
                    report.ik_residual_m[arm_idx] = sol.residual_m;
                    report.ik_converged[arm_idx] = true;

                    for (joint_idx, channel) in arm.channels.iter_mut().take(split).enumerate() {
                        let target_deg = channel.set_target_direct(sol.angles_deg[joint_idx]);
                        dems.joints
                            .insert(channel.id(), channel.demand(target_deg));
                    }
                }
                Some(ref sol) => {
                    report.ik_residual_m[arm_idx] = sol.residual_m;
                    report.ik_skipped[arm_idx] = true;
                    debug!(
                        "IK for {:?} arm did not converge (residual {:.4} m), holding base group",
                        arm.side, sol.residual_m
                    );
                    arm.demand_locked(dems);
                }
                None => {
                    report.ik_skipped[arm_idx] = true;
                    arm.demand_locked(dems);
                }
            }

            // ---- WRIST GROUP ----

            for (joint_idx, channel) in arm.channels.iter_mut().enumerate().skip(split) {
                let raw_deg = source_angle_deg(input_data.pose.as_ref(), channel.binding());

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
