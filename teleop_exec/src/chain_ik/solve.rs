//! Cyclic coordinate descent inverse kinematics
//!
//! CCD is described in https://en.wikipedia.org/wiki/Inverse_kinematics and
//! adjusts one joint at a time, tip to root, to reduce the distance between
//! the end-effector and the target. Visiting the tip first lets the joint
//! nearest the error null out the largest fraction of it before the upstream
//! joints are touched.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{ChainModel, IkParams};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Magnitude below which a projected vector has no well-defined direction
/// and the joint is skipped for the pass.
const DEGENERATE_NORM_M: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The output of one IK solve.
#[derive(Debug, Clone, Serialize)]
pub struct IkSolution {
    /// Solved joint angles, ordered base to end-effector.
    ///
    /// Units: degrees
    pub angles_deg: Vec<f64>,

    /// End-effector position achieved by the solved angles, computed via
    /// forward kinematics.
    ///
    /// Units: meters
    pub effector_m: Vector3<f64>,

    /// Distance between the achieved end-effector position and the target.
    ///
    /// Units: meters
    pub residual_m: f64,

    /// True if the residual is within tolerance, or within the relaxed
    /// partial-success band. Callers may act on a near-solution or reject
    /// it; the solver never escalates non-convergence as an error.
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the chain's joint angles for a target end-effector position.
///
/// The solve warm-starts from `seed_deg` (normally the currently commanded
/// angles) for pose continuity, and always returns the best angle vector
/// seen over the whole run - CCD is not monotonically convergent per joint
/// step, so the last vector is not necessarily the best one. The returned
/// vector therefore never has a residual worse than the seed's.
pub fn solve(
    model: &ChainModel,
    target_m: &Vector3<f64>,
    seed_deg: &[f64],
    params: &IkParams,
) -> IkSolution {
    let num_joints = model.num_joints();

    // Warm start from the seed, clamped into the joint limits
    let mut angles: Vec<f64> = (0..num_joints)
        .map(|i| {
            let (min_deg, max_deg) = model.joint_limits_deg(i);
            clamp(seed_deg.get(i).unwrap_or(&0.0), &min_deg, &max_deg)
        })
        .collect();

    let mut best_angles = angles.clone();
    let mut best_dist_m = (model.effector_position(&angles) - target_m).norm();

    for pass in 0..params.max_iterations {
        let mut improved = false;

        // Tip-to-root pass
        for i in (0..num_joints).rev() {
            let effector = model.effector_position(&angles);
            let dist_m = (effector - target_m).norm();

            if dist_m < params.tolerance_m {
                trace!("CCD converged in pass {} at joint {}", pass, i);
                return IkSolution {
                    angles_deg: angles,
                    effector_m: effector,
                    residual_m: dist_m,
                    converged: true,
                };
            }

            let joint_pos = model.joint_position(&angles, i);
            let axis = model.joint_world_axis(&angles, i);

            let to_effector = effector - joint_pos;
            let to_target = target_m - joint_pos;

            // Project both vectors onto the plane perpendicular to the
            // axis; the signed angle between the projections is the
            // single-axis rotation that best aligns the end-effector with
            // the target through this joint alone
            let proj_effector = to_effector - axis.into_inner() * axis.dot(&to_effector);
            let proj_target = to_target - axis.into_inner() * axis.dot(&to_target);

            if to_effector.norm() < DEGENERATE_NORM_M
                || proj_effector.norm() < DEGENERATE_NORM_M
                || proj_target.norm() < DEGENERATE_NORM_M
            {
                // No well-defined rotation contribution from this joint
                continue;
            }

            let correction_rad = axis
                .dot(&proj_effector.cross(&proj_target))
                .atan2(proj_effector.dot(&proj_target));

            let (min_deg, max_deg) = model.joint_limits_deg(i);
            angles[i] = clamp(
                &(angles[i] + correction_rad.to_degrees() * params.learning_rate),
                &min_deg,
                &max_deg,
            );

            let new_dist_m = (model.effector_position(&angles) - target_m).norm();
            if new_dist_m < best_dist_m {
                best_dist_m = new_dist_m;
                best_angles.copy_from_slice(&angles);
                improved = true;
            }
        }

        // A full pass with no improving update means the solve has stalled,
        // but transient non-improvement in the first few passes is normal
        if !improved && pass + 1 >= params.min_passes {
            trace!("CCD stalled after pass {}", pass);
            break;
        }
    }

    let effector = model.effector_position(&best_angles);
    let residual_m = (effector - target_m).norm();

    IkSolution {
        angles_deg: best_angles,
        effector_m: effector,
        residual_m,
        converged: residual_m < params.partial_tolerance_factor * params.tolerance_m,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::ChainGeom;
    use super::*;

    /// Two-joint planar chain with 0.3 m and 0.2 m links along X, both
    /// joints rotating about Z.
    fn planar_model() -> ChainModel {
        ChainModel::new(&ChainGeom {
            base_pos_m: [0.0; 3],
            base_rot_deg: [0.0; 3],
            joint_pos_m: vec![[0.0, 0.0, 0.0], [0.3, 0.0, 0.0]],
            joint_axis: vec![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
            joint_min_deg: vec![-180.0, -180.0],
            joint_max_deg: vec![180.0, 180.0],
            effector_pos_m: [0.5, 0.0, 0.0],
        })
        .unwrap()
    }

    fn test_params() -> IkParams {
        IkParams {
            max_iterations: 20,
            tolerance_m: 0.01,
            learning_rate: 0.8,
            min_passes: 5,
            partial_tolerance_factor: 2.0,
        }
    }

    #[test]
    fn test_planar_convergence() {
        let model = planar_model();
        let params = test_params();

        // Reachable target requiring a bent elbow
        let target = Vector3::new(0.4, 0.0, 0.0);
        let sol = solve(&model, &target, &[10.0, 10.0], &params);

        assert!(sol.converged);
        assert!(sol.residual_m < params.tolerance_m);

        // The reported effector position must match FK of the returned
        // angles
        let fk = model.effector_position(&sol.angles_deg);
        assert!((fk - sol.effector_m).norm() < 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let model = planar_model();
        let params = test_params();

        // Any pose within limits is reachable by construction, so solving
        // for its own FK position must converge
        for angles in [[30.0, 45.0], [-60.0, 110.0], [120.0, -90.0]].iter() {
            let target = model.effector_position(angles);
            let sol = solve(&model, &target, &[0.0, 0.0], &params);

            assert!(
                sol.converged,
                "failed to re-reach FK position of {:?}",
                angles
            );
            assert!(sol.residual_m < params.tolerance_m);
        }
    }

    #[test]
    fn test_best_effort_never_worse_than_seed() {
        let model = planar_model();
        let params = test_params();

        // Unreachable target well beyond the 0.5 m reach
        let target = Vector3::new(2.0, 0.0, 0.0);
        let seed = [90.0, 90.0];

        let seed_residual = (model.effector_position(&seed) - target).norm();
        let sol = solve(&model, &target, &seed, &params);

        assert!(!sol.converged);
        assert!(sol.residual_m <= seed_residual);

        // Best effort for a target straight out along X is the fully
        // extended arm, residual 1.5 m
        assert!((sol.residual_m - 1.5).abs() < 0.05);
    }

    #[test]
    fn test_degenerate_target_at_root() {
        let model = planar_model();
        let params = test_params();

        // Target on the root joint: the to-target projection for the base
        // joint is near zero, which must be skipped rather than produce
        // NaNs
        let target = Vector3::new(0.0, 0.0, 0.0);
        let sol = solve(&model, &target, &[0.0, 0.0], &params);

        for a in sol.angles_deg.iter() {
            assert!(a.is_finite());
        }
        assert!(sol.residual_m.is_finite());
    }

    #[test]
    fn test_limits_respected() {
        let model = ChainModel::new(&ChainGeom {
            base_pos_m: [0.0; 3],
            base_rot_deg: [0.0; 3],
            joint_pos_m: vec![[0.0, 0.0, 0.0], [0.3, 0.0, 0.0]],
            joint_axis: vec![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
            joint_min_deg: vec![-45.0, -45.0],
            joint_max_deg: vec![45.0, 45.0],
            effector_pos_m: [0.5, 0.0, 0.0],
        })
        .unwrap();
        let params = test_params();

        // Target behind the arm cannot be reached inside +/-45 degrees;
        // the solution must still respect the limits
        let target = Vector3::new(-0.5, 0.0, 0.0);
        let sol = solve(&model, &target, &[0.0, 0.0], &params);

        for (i, a) in sol.angles_deg.iter().enumerate() {
            let (min_deg, max_deg) = model.joint_limits_deg(i);
            assert!(*a >= min_deg && *a <= max_deg);
        }
    }

    #[test]
    fn test_warm_start_continuity() {
        let model = planar_model();
        let params = test_params();

        // Two elbow-up/elbow-down symmetric solutions exist; seeding near
        // the elbow-up one must return it rather than the mirror
        let target = Vector3::new(0.35, 0.2, 0.0);

        let sol_up = solve(&model, &target, &[40.0, -30.0], &params);
        assert!(sol_up.converged);
        assert!(sol_up.angles_deg[1] < 0.0);

        let sol_down = solve(&model, &target, &[-10.0, 40.0], &params);
        assert!(sol_down.converged);
        assert!(sol_down.angles_deg[1] > 0.0);
    }
}
