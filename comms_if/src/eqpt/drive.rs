//! # Drive Equipment Demands
//!
//! Demands produced once per control cycle for the joint actuation layer.
//! The actuation layer translates each demand into torque/position control
//! and reports no failures back (fire and forget).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ArmSide;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of rotational joints on each arm.
pub const NUM_ARM_JOINTS: usize = 7;

const LEFT_ARM_IDS: [JointId; NUM_ARM_JOINTS] = [
    JointId::LShoulderPitch,
    JointId::LShoulderRoll,
    JointId::LShoulderYaw,
    JointId::LElbowPitch,
    JointId::LWristYaw,
    JointId::LWristPitch,
    JointId::LWristRoll,
];

const RIGHT_ARM_IDS: [JointId; NUM_ARM_JOINTS] = [
    JointId::RShoulderPitch,
    JointId::RShoulderRoll,
    JointId::RShoulderYaw,
    JointId::RElbowPitch,
    JointId::RWristYaw,
    JointId::RWristPitch,
    JointId::RWristRoll,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demand for a single joint drive.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct JointDem {
    /// The demanded joint position in degrees.
    pub target_deg: f64,

    /// Position gain of the drive.
    pub stiffness: f64,

    /// Velocity gain of the drive.
    pub damping: f64,

    /// Maximum force the drive may exert.
    pub force_limit: f64,
}

/// Demands sent to the drive actuation layer, keyed by joint.
///
/// Joints absent from the map carry no new demand this cycle and the
/// actuation layer shall hold their previous targets.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct DriveDems {
    /// Per-joint drive demands.
    pub joints: HashMap<JointId, JointDem>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all arm joints available to the robot.
///
/// Each arm is a serial chain ordered base to end-effector: shoulder pitch,
/// shoulder roll, shoulder yaw, elbow pitch, wrist yaw, wrist pitch, wrist
/// roll.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum JointId {
    LShoulderPitch,
    LShoulderRoll,
    LShoulderYaw,
    LElbowPitch,
    LWristYaw,
    LWristPitch,
    LWristRoll,
    RShoulderPitch,
    RShoulderRoll,
    RShoulderYaw,
    RElbowPitch,
    RWristYaw,
    RWristPitch,
    RWristRoll,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// Get the joints of one arm, ordered base to end-effector.
    pub fn arm_ids(side: ArmSide) -> [JointId; NUM_ARM_JOINTS] {
        match side {
            ArmSide::Left => LEFT_ARM_IDS,
            ArmSide::Right => RIGHT_ARM_IDS,
        }
    }
}

