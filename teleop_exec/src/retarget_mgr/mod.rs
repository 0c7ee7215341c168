//! Retargeting manager module
//!
//! Converts the operator's tracked pose into joint drive demands once per
//! control cycle, using the active control mode:
//!
//! - `SingleJoint`: every joint follows its bound source orientation through
//!   the per-joint filtering pipeline.
//! - `Ik`: each arm's wrist target is solved by the CCD solver and the
//!   resulting angles are pushed directly to the drives.
//! - `Hybrid`: the shoulder/elbow group takes the IK solution while the
//!   wrist group keeps following its source orientations.
//!
//! The module also performs one-shot arm calibration: neutrals are rebased
//! from the current pose and the arm is snapped and held at the configured
//! angles for a fixed duration.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_hybrid;
mod calc_ik;
mod calc_single_joint;
mod calib;
mod ik_target;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use comms_if::eqpt::ArmSide;
use util::params as util_params;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during RetargetMgr operation.
#[derive(Debug, thiserror::Error)]
pub enum RetargetMgrError {
    #[error("Expected {expected} calibration targets but got {got}")]
    InvalidCalibTargets { expected: usize, got: usize },
}

/// Possible errors that can occur during RetargetMgr initialisation.
#[derive(Debug, thiserror::Error)]
pub enum RetargetMgrInitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(#[from] util_params::LoadError),

    #[error("Invalid chain geometry: {0}")]
    GeomError(#[from] crate::chain_ik::ChainError),

    #[error("{side:?} arm chain has {num_joints} joints, expected {expected}")]
    WrongJointCount {
        side: ArmSide,
        num_joints: usize,
        expected: usize,
    },

    #[error("{side:?} arm has {num_channels} channel configs for {num_joints} joints")]
    MismatchedChannelCount {
        side: ArmSide,
        num_channels: usize,
        num_joints: usize,
    },
}
