//! Parameters structures for the kinematic chain and IK solver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Physical layout of one arm chain in its reference (all-zero-angle) pose.
///
/// This is the one-time geometry import from which the chain model caches
/// its link offsets; the model never reads live joint transforms.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChainGeom {
    /// Position of the robot base frame origin in the world frame.
    ///
    /// Units: meters
    pub base_pos_m: [f64; 3],

    /// Orientation of the robot base frame as intrinsic roll/pitch/yaw.
    ///
    /// Units: degrees
    pub base_rot_deg: [f64; 3],

    /// World position of each joint origin in the reference pose, ordered
    /// base to end-effector.
    ///
    /// Units: meters
    pub joint_pos_m: Vec<[f64; 3]>,

    /// Rotation axis of each joint, expressed in the base frame at the
    /// reference pose. Need not be normalised.
    pub joint_axis: Vec<[f64; 3]>,

    /// Minimum angle of each joint.
    ///
    /// Units: degrees
    pub joint_min_deg: Vec<f64>,

    /// Maximum angle of each joint.
    ///
    /// Units: degrees
    pub joint_max_deg: Vec<f64>,

    /// World position of the end-effector reference point in the reference
    /// pose.
    ///
    /// Units: meters
    pub effector_pos_m: [f64; 3],
}

/// Parameters for the CCD inverse kinematics solver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IkParams {
    /// Maximum number of outer passes over the chain.
    pub max_iterations: usize,

    /// Residual distance below which the solution is converged.
    ///
    /// Units: meters
    pub tolerance_m: f64,

    /// Damping applied to each per-joint correction, in (0, 1]. Values
    /// below 1 trade convergence speed for stability when several joints
    /// share influence over the error.
    pub learning_rate: f64,

    /// Minimum number of passes before a pass with no improving update is
    /// allowed to terminate the solve.
    pub min_passes: usize,

    /// Factor on `tolerance_m` within which a non-converged best effort is
    /// still reported as a success. Tunable, not load-bearing.
    pub partial_tolerance_factor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for IkParams {
    fn default() -> Self {
        IkParams {
            max_iterations: 10,
            tolerance_m: 0.01,
            learning_rate: 0.8,
            min_passes: 5,
            partial_tolerance_factor: 2.0,
        }
    }
}
