//! # Tracked Operator Pose
//!
//! Pose samples read from the operator tracking layer once per control
//! cycle. A sample carries a rotation per tracked source joint plus the
//! world-space anchor positions used to build the IK target for each arm.
//!
//! Any part of a sample may be absent: a joint the tracker lost that cycle
//! simply has no entry, and the consumer shall skip it without error.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ArmSide;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single pose sample from the tracking layer.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TrackedPose {
    /// Acquisition time stamped by the tracking layer, if it provides one.
    pub timestamp: Option<DateTime<Utc>>,

    /// Orientation of each tracked source joint, in that joint's local
    /// reference frame.
    pub orientations: HashMap<TrackedJointId, UnitQuaternion<f64>>,

    /// World-space anchor points per arm, used to derive the IK target.
    pub anchors: HashMap<ArmSide, ArmAnchors>,
}

/// The world-space anchor points of one tracked arm.
#[derive(Serialize, Deserialize, Debug, Copy, Clone)]
pub struct ArmAnchors {
    /// Position of the operator's shoulder in meters.
    pub shoulder_m: Vector3<f64>,

    /// Position of the operator's wrist in meters.
    pub wrist_m: Vector3<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of tracked source joints on the operator's skeleton.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum TrackedJointId {
    LUpperArm,
    LForearm,
    LHand,
    RUpperArm,
    RForearm,
    RHand,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrackedPose {
    /// Get the orientation of a tracked joint, or `None` if the tracker has
    /// no sample for it this cycle.
    pub fn orientation(&self, id: TrackedJointId) -> Option<&UnitQuaternion<f64>> {
        self.orientations.get(&id)
    }

    /// Get the arm anchors for a side, or `None` if that arm is not tracked
    /// this cycle.
    pub fn anchors(&self, side: ArmSide) -> Option<&ArmAnchors> {
        self.anchors.get(&side)
    }
}
