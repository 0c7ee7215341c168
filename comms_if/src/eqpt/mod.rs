//! # Equipment interface module
//!
//! Defines the data exchanged with the robot's equipment: drive demands sent
//! to the joint actuation layer and pose samples read from the operator
//! tracking layer.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod drive;
pub mod pose;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Identifies one of the robot's two arms.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ArmSide {
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmSide {
    /// Both arm sides in a fixed order (left first).
    pub const BOTH: [ArmSide; 2] = [ArmSide::Left, ArmSide::Right];

    /// Index of this side into per-arm arrays, matching the order of
    /// [`ArmSide::BOTH`].
    pub fn index(&self) -> usize {
        match self {
            ArmSide::Left => 0,
            ArmSide::Right => 1,
        }
    }
}

impl std::str::FromStr for ArmSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(ArmSide::Left),
            "right" => Ok(ArmSide::Right),
            _ => Err(format!("{} is not a recognised arm side", s)),
        }
    }
}
