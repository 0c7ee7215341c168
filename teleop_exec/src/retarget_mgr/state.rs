//! Implementations for the RetargetMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{ArmParams, Params, RetargetMgrError, RetargetMgrInitError};
use crate::chain_ik::ChainModel;
use crate::joint_retarget::JointChannel;
use comms_if::{
    eqpt::drive::{DriveDems, JointId, NUM_ARM_JOINTS},
    eqpt::pose::TrackedPose,
    eqpt::ArmSide,
    tc::retarget::{ControlMode, RetargetCmd},
};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Retargeting manager module state
#[derive(Default)]
pub struct RetargetMgr {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    pub(crate) mode: ControlMode,

    /// When true the arms hold their current commanded angles and ignore
    /// the operator's pose.
    pub(crate) stopped: bool,

    /// Both arm chains, ordered as [`ArmSide::BOTH`]. Empty until the
    /// module is initialised.
    pub(crate) arms: Vec<ArmChain>,

    pub(crate) output: Option<DriveDems>,
}

/// One arm chain owned by the retargeting manager.
pub(crate) struct ArmChain {
    pub(crate) side: ArmSide,

    /// The per-joint retargeting channels, ordered base to end-effector.
    pub(crate) channels: Vec<JointChannel>,

    /// The cached kinematic model used for FK/IK.
    pub(crate) model: ChainModel,

    /// The smoothed IK target from the previous cycle, or `None` before the
    /// first target is computed.
    pub(crate) smoothed_target_m: Option<Vector3<f64>>,

    /// Time at which the calibration hold on this arm expires, or `None` if
    /// the arm is not held.
    ///
    /// Units: seconds (session-elapsed)
    pub(crate) lock_until_s: Option<f64>,
}

/// Input data to the retargeting manager.
#[derive(Default, Clone)]
pub struct InputData {
    /// The retarget command to be executed, or `None` if there is no new
    /// command on this cycle.
    pub cmd: Option<RetargetCmd>,

    /// The operator pose sample for this cycle, or `None` if the tracking
    /// layer produced nothing.
    pub pose: Option<TrackedPose>,

    /// Session-elapsed time at the start of this cycle.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Duration of the control cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Status report for RetargetMgr processing.
#[derive(Clone, Serialize, Debug, Default)]
pub struct StatusReport {
    /// The control mode active this cycle.
    pub mode: ControlMode,

    /// True while an arm hold (Stop command or safe mode) is in force.
    pub stopped: bool,

    /// Per-arm IK convergence flag, valid in Ik/Hybrid modes.
    pub ik_converged: [bool; 2],

    /// Per-arm IK residual distance.
    ///
    /// Units: meters
    pub ik_residual_m: [f64; 2],

    /// Per-arm flag raised when no new IK angles were applied this cycle.
    pub ik_skipped: [bool; 2],

    pub dead_hold: [[bool; NUM_ARM_JOINTS]; 2],
    pub soft_limited: [[bool; NUM_ARM_JOINTS]; 2],
    pub rate_limited: [[bool; NUM_ARM_JOINTS]; 2],
    pub abs_pos_limited: [[bool; NUM_ARM_JOINTS]; 2],
    pub locked: [[bool; NUM_ARM_JOINTS]; 2],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for RetargetMgr {
    type InitData = &'static str;
    type InitError = RetargetMgrInitError;

    type InputData = InputData;
    type OutputData = DriveDems;
    type StatusReport = StatusReport;
    type ProcError = RetargetMgrError;

    /// Initialise the RetargetMgr module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        // Load the parameters
        let params: Params = util::params::load(init_data)?;

        // Build the module from the loaded parameters
        *self = Self::from_params(params)?;

        Ok(())
    }

    /// Perform cyclic processing of the retargeting manager.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Check to see if there's a new command
        if let Some(cmd) = &input_data.cmd {
            self.exec_cmd(cmd.clone(), input_data)?;
        }

        // Release any calibration holds which have expired
        self.release_expired_locks(input_data.time_s);

        // Calculate the demands for this cycle
        let mut dems = DriveDems::default();

        if self.stopped {
            self.calc_hold(&mut dems);
        } else {
            match self.mode {
                ControlMode::SingleJoint => self.calc_single_joint(input_data, &mut dems),
                ControlMode::Ik => self.calc_ik(input_data, &mut dems),
                ControlMode::Hybrid => self.calc_hybrid(input_data, &mut dems),
            }
        }

        // Record mode and lock state in the report
        self.report.mode = self.mode;
        self.report.stopped = self.stopped;

        for (arm_idx, arm) in self.arms.iter().enumerate() {
            for (joint_idx, channel) in arm.channels.iter().enumerate() {
                self.report.locked[arm_idx][joint_idx] = channel.is_locked();
            }
        }

        // Update the output in self
        self.output = Some(dems.clone());

        Ok((dems, self.report.clone()))
    }
}

impl RetargetMgr {
    /// Build the module directly from a parameters structure.
    ///
    /// Used by `init` after loading the parameter file, and by tests and
    /// benchmarks which build parameters in code.
    pub fn from_params(params: Params) -> Result<Self, RetargetMgrInitError> {
        let arms = vec![
            ArmChain::from_params(ArmSide::Left, &params.left_arm)?,
            ArmChain::from_params(ArmSide::Right, &params.right_arm)?,
        ];

        Ok(RetargetMgr {
            params,
            report: StatusReport::default(),
            mode: ControlMode::default(),
            stopped: false,
            arms,
            output: None,
        })
    }

    /// The currently active control mode.
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Function called when entering safe mode.
    ///
    /// Must result in no motion of the arms: demands hold at the current
    /// commanded angles until a new command arrives.
    pub fn make_safe(&mut self) {
        self.stopped = true;
    }

    /// Execute a new retarget command.
    fn exec_cmd(
        &mut self,
        cmd: RetargetCmd,
        input_data: &InputData,
    ) -> Result<(), RetargetMgrError> {
        // Ouptut the command in debug mode
        debug!("New RetargetCmd::{:?}", cmd);

        match cmd {
            RetargetCmd::SetMode { mode } => {
                self.mode = mode;
                self.stopped = false;
                info!("Control mode set to {:?}", mode);
            }
            RetargetCmd::CycleMode => {
                self.mode = self.mode.next();
                self.stopped = false;
                info!("Control mode cycled to {:?}", self.mode);
            }
            RetargetCmd::Calibrate {
                arm,
                targets_deg,
                hold_s,
            } => self.calibrate(arm, targets_deg.as_deref(), hold_s, input_data)?,
            RetargetCmd::Stop => {
                self.stopped = true;
                info!("Arm hold commanded");
            }
        }

        Ok(())
    }

    /// Demand the current commanded angle for every joint, holding the arms
    /// in place.
    fn calc_hold(&self, dems: &mut DriveDems) {
        for arm in self.arms.iter() {
            for channel in arm.channels.iter() {
                dems.joints
                    .insert(channel.id(), channel.demand(channel.last_cmd_deg()));
            }
        }
    }
}

impl ArmChain {
    /// Build one arm chain from its parameters.
    fn from_params(side: ArmSide, arm_params: &ArmParams) -> Result<Self, RetargetMgrInitError> {
        let model = ChainModel::new(&arm_params.geom)?;

        if model.num_joints() != NUM_ARM_JOINTS {
            return Err(RetargetMgrInitError::WrongJointCount {
                side,
                num_joints: model.num_joints(),
                expected: NUM_ARM_JOINTS,
            });
        }

        if arm_params.channels.len() != model.num_joints() {
            return Err(RetargetMgrInitError::MismatchedChannelCount {
                side,
                num_channels: arm_params.channels.len(),
                num_joints: model.num_joints(),
            });
        }

        let ids = JointId::arm_ids(side);

        let channels = arm_params
            .channels
            .iter()
            .enumerate()
            .map(|(joint_idx, channel_params)| {
                let (min_deg, max_deg) = model.joint_limits_deg(joint_idx);

                JointChannel::new(
                    ids[joint_idx],
                    min_deg,
                    max_deg,
                    channel_params.stiffness,
                    channel_params.damping,
                    channel_params.force_limit,
                    channel_params.config.clone(),
                    channel_params.source,
                )
            })
            .collect();

        Ok(ArmChain {
            side,
            channels,
            model,
            smoothed_target_m: None,
            lock_until_s: None,
        })
    }

    /// Demand the locked target for every locked channel.
    ///
    /// Used on cycles where the normal calculation path produced no demand
    /// for the arm, so that a calibration hold is pushed to the drives
    /// without a one-cycle fall-through.
    pub(crate) fn demand_locked(&self, dems: &mut DriveDems) {
        for channel in self.channels.iter() {
            if channel.is_locked() {
                dems.joints
                    .insert(channel.id(), channel.demand(channel.last_cmd_deg()));
            }
        }
    }
}
