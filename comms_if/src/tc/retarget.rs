//! # Retargeting manager telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use crate::eqpt::ArmSide;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be executed by the retargeting manager.
#[derive(Debug, Clone, Serialize, Deserialize, StructOpt, PartialEq)]
pub enum RetargetCmd {
    /// Select the control mode used to map the operator's pose onto the arms.
    ///
    /// Switching mode has no side effects other than changing which per-cycle
    /// calculation runs; all channel state persists across the switch.
    #[structopt(name = "mode")]
    SetMode {
        /// The control mode to select.
        mode: ControlMode,
    },

    /// Advance to the next control mode in the fixed cycle
    /// SingleJoint -> Ik -> Hybrid -> SingleJoint.
    #[structopt(name = "cycle")]
    CycleMode,

    /// Rebase the calibration neutrals of one arm from the current pose
    /// sample, then snap and hold the arm at the desired joint angles.
    #[structopt(name = "calib")]
    Calibrate {
        /// The arm to calibrate.
        arm: ArmSide,

        /// Per-joint desired angles in degrees, base to end-effector.
        ///
        /// When absent the configured calibration targets are used.
        #[structopt(skip)]
        targets_deg: Option<Vec<f64>>,

        /// How long to hold the arm locked at the targets, in seconds.
        ///
        /// When absent the configured hold duration is used.
        #[structopt(long)]
        hold_s: Option<f64>,
    },

    /// Hold both arms at their current commanded angles, ignoring the
    /// operator's pose until another command arrives.
    #[structopt(name = "stop")]
    Stop,
}

/// The control mode selecting how operator pose becomes joint demands.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ControlMode {
    /// Every joint follows its bound source orientation through the
    /// per-joint filtering pipeline. No coupling between joints.
    SingleJoint,

    /// Joint angles are solved from the wrist-position IK target and pushed
    /// directly to the drives, bypassing the filtering pipeline.
    Ik,

    /// Shoulder and elbow joints take the IK solution directly while the
    /// wrist joints continue to follow their source orientations through
    /// the filtering pipeline.
    Hybrid,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ControlMode {
    /// The next mode in the fixed cycle.
    pub fn next(&self) -> Self {
        match self {
            ControlMode::SingleJoint => ControlMode::Ik,
            ControlMode::Ik => ControlMode::Hybrid,
            ControlMode::Hybrid => ControlMode::SingleJoint,
        }
    }
}

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::SingleJoint
    }
}

impl std::str::FromStr for ControlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(ControlMode::SingleJoint),
            "ik" => Ok(ControlMode::Ik),
            "hybrid" => Ok(ControlMode::Hybrid),
            _ => Err(format!("{} is not a recognised control mode", s)),
        }
    }
}
