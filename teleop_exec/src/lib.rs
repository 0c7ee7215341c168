//! # Teleoperation executable library.
//!
//! This library allows other crates in the workspace (and the integration
//! tests) to access items defined inside the teleop crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematic chain model - cached link geometry, forward kinematics and the
/// CCD inverse kinematics solver
pub mod chain_ik;

/// Global data store for the executable
pub mod data_store;

/// Per-joint retargeting pipeline - maps a raw source angle onto a safe
/// drive target through calibration, dead-zone, smoothing and limiting
pub mod joint_retarget;

/// Pose replay source - provides tracked operator pose samples from a
/// recorded trajectory file
pub mod pose_replay;

/// Retargeting manager module - converts operator pose samples into joint
/// drive demands using the selected control mode
pub mod retarget_mgr;

/// Telecommand processor - routes incoming TCs into the data store
pub mod tc_processor;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target period of one control cycle.
pub const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
pub const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;
