//! Parameters structure for RetargetMgr

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::chain_ik::{ChainGeom, IkParams};
use crate::joint_retarget::{ChannelConfig, SourceBinding};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the retargeting manager.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- CONTROL ----
    /// Number of base-side joints driven by the IK solution in Hybrid mode.
    /// The remaining joints keep following their source orientations
    /// through the filtering pipeline.
    pub hybrid_split_index: usize,

    // ---- IK SOLVER ----
    /// CCD solver configuration, shared by both arms.
    pub ik: IkParams,

    // ---- IK TARGET MAPPING ----
    /// Uniform scale factor from operator arm vectors to robot arm vectors
    /// (robot reach divided by operator reach). Supplied by configuration
    /// or calibration, never derived automatically.
    pub arm_scale: f64,

    /// Exponential smoothing coefficient in [0, 1] applied to the IK target
    /// to suppress tracking jitter. Values near 1 track instantly.
    pub target_smooth_alpha: f64,

    /// Lower corner of the optional IK target clamp box, in the robot base
    /// frame. Both corners must be set for clamping to apply.
    ///
    /// Units: meters
    pub target_clamp_min_m: Option<[f64; 3]>,

    /// Upper corner of the optional IK target clamp box, in the robot base
    /// frame.
    ///
    /// Units: meters
    pub target_clamp_max_m: Option<[f64; 3]>,

    /// Fixed end-effector offset added to the IK target in the robot base
    /// frame.
    ///
    /// Units: meters
    pub effector_offset_m: [f64; 3],

    // ---- CALIBRATION ----
    /// Per-joint angles the arm is snapped to on calibration, base to
    /// end-effector.
    ///
    /// Units: degrees
    pub calib_targets_deg: Vec<f64>,

    /// How long the arm is held locked after calibration.
    ///
    /// Units: seconds
    pub calib_hold_s: f64,

    // ---- ARMS ----
    /// Left arm geometry and channel configuration.
    pub left_arm: ArmParams,

    /// Right arm geometry and channel configuration.
    pub right_arm: ArmParams,
}

/// Per-arm parameters.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ArmParams {
    /// Reference-pose geometry of the arm chain.
    pub geom: ChainGeom,

    /// Per-joint channel configuration, ordered base to end-effector. Must
    /// have one entry per chain joint.
    pub channels: Vec<ChannelParams>,
}

/// Per-joint channel parameters.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChannelParams {
    /// Mapping and filtering configuration.
    pub config: ChannelConfig,

    /// Drive position gain, passed through to the actuation layer.
    pub stiffness: f64,

    /// Drive velocity gain, passed through to the actuation layer.
    pub damping: f64,

    /// Drive force limit, passed through to the actuation layer.
    pub force_limit: f64,

    /// Source binding, or `None` for a joint with no tracked source (such
    /// joints only move under IK or calibration).
    pub source: Option<SourceBinding>,
}
