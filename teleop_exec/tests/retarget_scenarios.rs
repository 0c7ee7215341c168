//! Integration scenarios for the retargeting manager
//!
//! Drives the module through its public cyclic interface with hand-built
//! parameters and pose samples, covering calibration, mode dispatch, IK
//! failure handling and the hybrid split.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector3};
use std::collections::HashMap;

use comms_if::eqpt::drive::JointId;
use comms_if::eqpt::pose::{ArmAnchors, TrackedJointId, TrackedPose};
use comms_if::eqpt::ArmSide;
use comms_if::tc::retarget::{ControlMode, RetargetCmd};
use teleop_lib::chain_ik::{ChainGeom, ChainModel, IkParams};
use teleop_lib::joint_retarget::{ChannelConfig, EulerAxis, SourceBinding};
use teleop_lib::retarget_mgr::{ArmParams, ChannelParams, InputData, Params, RetargetMgr};
use util::module::State as _;

// ---------------------------------------------------------------------------
// HELPERS
// ---------------------------------------------------------------------------

/// Geometry for one arm: seven joints spaced 0.1 m apart along X with a
/// 0.1 m effector link, axes alternating so the chain can reach in 3D.
fn arm_geom() -> ChainGeom {
    ChainGeom {
        base_pos_m: [0.0; 3],
        base_rot_deg: [0.0; 3],
        joint_pos_m: (0..7).map(|i| [0.1 * i as f64, 0.0, 0.0]).collect(),
        joint_axis: vec![
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        joint_min_deg: vec![-175.0; 7],
        joint_max_deg: vec![175.0; 7],
        effector_pos_m: [0.7, 0.0, 0.0],
    }
}

/// Source bindings for one side: upper arm feeds the shoulder triplet,
/// forearm the elbow, hand the wrist triplet.
fn bindings(side: ArmSide) -> Vec<Option<SourceBinding>> {
    let (upper, fore, hand) = match side {
        ArmSide::Left => (
            TrackedJointId::LUpperArm,
            TrackedJointId::LForearm,
            TrackedJointId::LHand,
        ),
        ArmSide::Right => (
            TrackedJointId::RUpperArm,
            TrackedJointId::RForearm,
            TrackedJointId::RHand,
        ),
    };

    let bind = |source, axis| Some(SourceBinding {
        source,
        axis,
        sign: 1.0,
    });

    vec![
        bind(upper, EulerAxis::Yaw),
        bind(upper, EulerAxis::Pitch),
        bind(upper, EulerAxis::Roll),
        bind(fore, EulerAxis::Pitch),
        bind(hand, EulerAxis::Roll),
        bind(hand, EulerAxis::Pitch),
        bind(hand, EulerAxis::Yaw),
    ]
}

fn arm_params(side: ArmSide) -> ArmParams {
    let channels = bindings(side)
        .into_iter()
        .map(|source| ChannelParams {
            config: ChannelConfig::default(),
            stiffness: 400.0,
            damping: 40.0,
            force_limit: 80.0,
            source,
        })
        .collect();

    ArmParams {
        geom: arm_geom(),
        channels,
    }
}

fn test_params() -> Params {
    Params {
        hybrid_split_index: 4,
        ik: IkParams {
            max_iterations: 50,
            tolerance_m: 0.005,
            learning_rate: 0.8,
            min_passes: 5,
            partial_tolerance_factor: 2.0,
        },
        arm_scale: 1.0,
        target_smooth_alpha: 1.0,
        target_clamp_min_m: None,
        target_clamp_max_m: None,
        effector_offset_m: [0.0; 3],
        calib_targets_deg: vec![90.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        calib_hold_s: 1.0,
        left_arm: arm_params(ArmSide::Left),
        right_arm: arm_params(ArmSide::Right),
    }
}

/// A pose sample with the left upper arm rotated to the given yaw and no
/// other sources tracked.
fn left_upper_yaw_pose(yaw_deg: f64) -> TrackedPose {
    let mut orientations = HashMap::new();
    orientations.insert(
        TrackedJointId::LUpperArm,
        UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_deg.to_radians()),
    );

    TrackedPose {
        timestamp: None,
        orientations,
        anchors: HashMap::new(),
    }
}

/// A pose sample with left arm anchors such that the scaled wrist vector is
/// `reach_m`.
fn left_anchor_pose(reach_m: Vector3<f64>) -> TrackedPose {
    let mut anchors = HashMap::new();
    anchors.insert(
        ArmSide::Left,
        ArmAnchors {
            shoulder_m: Vector3::new(0.2, 0.3, 1.4),
            wrist_m: Vector3::new(0.2, 0.3, 1.4) + reach_m,
        },
    );

    TrackedPose {
        timestamp: None,
        orientations: HashMap::new(),
        anchors,
    }
}

fn input(pose: Option<TrackedPose>, cmd: Option<RetargetCmd>, time_s: f64) -> InputData {
    InputData {
        cmd,
        pose,
        time_s,
        dt_s: 0.02,
    }
}

fn left_ids() -> [JointId; 7] {
    JointId::arm_ids(ArmSide::Left)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[test]
fn calibration_snaps_and_holds() {
    let mut mgr = RetargetMgr::from_params(test_params()).unwrap();

    let calibrate = RetargetCmd::Calibrate {
        arm: ArmSide::Left,
        targets_deg: None,
        hold_s: None,
    };

    // Calibrate from an arbitrary pose
    let (dems, _) = mgr
        .proc(&input(Some(left_upper_yaw_pose(30.0)), Some(calibrate), 0.0))
        .unwrap();

    // Every left joint must command the desired target exactly
    let expected = [90.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    for (i, id) in left_ids().iter().enumerate() {
        assert_eq!(dems.joints[id].target_deg, expected[i], "joint {}", i);
    }

    // Drive gains pass through unmodified
    assert_eq!(dems.joints[&JointId::LShoulderPitch].stiffness, 400.0);
    assert_eq!(dems.joints[&JointId::LShoulderPitch].damping, 40.0);
    assert_eq!(dems.joints[&JointId::LShoulderPitch].force_limit, 80.0);

    // During the hold wild source motion must not move the arm
    let (dems, report) = mgr
        .proc(&input(Some(left_upper_yaw_pose(-120.0)), None, 0.5))
        .unwrap();
    for (i, id) in left_ids().iter().enumerate() {
        assert_eq!(dems.joints[id].target_deg, expected[i]);
        assert!(report.locked[0][i]);
    }

    // After the hold expires, tracking resumes relative to the captured
    // neutral: yaw 40 deg against a 30 deg neutral is a 10 deg delta on
    // top of the 90 deg calibration offset
    let (dems, report) = mgr
        .proc(&input(Some(left_upper_yaw_pose(40.0)), None, 1.1))
        .unwrap();
    assert!(!report.locked[0][0]);
    assert!((dems.joints[&JointId::LShoulderPitch].target_deg - 100.0).abs() < 1e-9);
}

#[test]
fn calibration_rejects_bad_target_vector() {
    let mut mgr = RetargetMgr::from_params(test_params()).unwrap();

    let calibrate = RetargetCmd::Calibrate {
        arm: ArmSide::Left,
        targets_deg: Some(vec![1.0, 2.0]),
        hold_s: None,
    };

    assert!(mgr
        .proc(&input(Some(left_upper_yaw_pose(0.0)), Some(calibrate), 0.0))
        .is_err());
}

#[test]
fn ik_mode_reaches_target() {
    let mut mgr = RetargetMgr::from_params(test_params()).unwrap();

    let set_ik = RetargetCmd::SetMode {
        mode: ControlMode::Ik,
    };

    let reach = Vector3::new(0.4, 0.1, 0.1);
    let (dems, report) = mgr
        .proc(&input(Some(left_anchor_pose(reach)), Some(set_ik), 0.0))
        .unwrap();

    assert_eq!(mgr.mode(), ControlMode::Ik);
    assert!(report.ik_converged[0]);
    assert!(!report.ik_skipped[0]);

    // The right arm has no anchors so it must be silently skipped
    assert!(report.ik_skipped[1]);
    assert!(!dems.joints.contains_key(&JointId::RShoulderPitch));

    // FK of the demanded angles must land on the target within the relaxed
    // tolerance band
    let model = ChainModel::new(&arm_geom()).unwrap();
    let angles: Vec<f64> = left_ids()
        .iter()
        .map(|id| dems.joints[id].target_deg)
        .collect();

    // The target is the base-relative reach vector (identity base frame)
    let residual = (model.effector_position(&angles) - reach).norm();
    assert!(residual < 0.01, "residual {} m too large", residual);
}

#[test]
fn ik_failure_holds_previous_demands() {
    let mut mgr = RetargetMgr::from_params(test_params()).unwrap();

    let set_ik = RetargetCmd::SetMode {
        mode: ControlMode::Ik,
    };

    // Unreachable target: far beyond the 0.7 m reach
    let (dems, report) = mgr
        .proc(&input(
            Some(left_anchor_pose(Vector3::new(5.0, 0.0, 0.0))),
            Some(set_ik),
            0.0,
        ))
        .unwrap();

    assert!(!report.ik_converged[0]);
    assert!(report.ik_skipped[0]);

    // No new demands for the arm: previous drive targets remain in force
    for id in left_ids().iter() {
        assert!(!dems.joints.contains_key(id));
    }
}

#[test]
fn hybrid_splits_ik_and_pipeline() {
    let mut mgr = RetargetMgr::from_params(test_params()).unwrap();

    let set_hybrid = RetargetCmd::SetMode {
        mode: ControlMode::Hybrid,
    };

    // Pose with both anchors and a hand orientation: wrist yaw channel is
    // bound to LHand yaw
    let mut pose = left_anchor_pose(Vector3::new(0.4, 0.1, 0.1));
    pose.orientations.insert(
        TrackedJointId::LHand,
        UnitQuaternion::from_euler_angles(0.0, 0.0, 20f64.to_radians()),
    );

    let (dems, report) = mgr
        .proc(&input(Some(pose), Some(set_hybrid), 0.0))
        .unwrap();

    assert!(report.ik_converged[0]);

    let ids = left_ids();

    // Base-side group is driven by IK
    for id in ids.iter().take(4) {
        assert!(dems.joints.contains_key(id));
    }

    // Wrist yaw follows the hand orientation directly
    assert!((dems.joints[&JointId::LWristRoll].target_deg - 20.0).abs() < 1e-9);

    // Wrist joints with no sample this cycle are skipped: LHand pitch and
    // roll are present (zero) because the hand orientation carries all
    // three components
    assert!((dems.joints[&JointId::LWristYaw].target_deg - 0.0).abs() < 1e-9);
}

#[test]
fn stop_holds_and_mode_change_resumes() {
    let mut mgr = RetargetMgr::from_params(test_params()).unwrap();

    // Track to some pose first
    let (dems, _) = mgr
        .proc(&input(Some(left_upper_yaw_pose(25.0)), None, 0.0))
        .unwrap();
    assert!((dems.joints[&JointId::LShoulderPitch].target_deg - 25.0).abs() < 1e-9);

    // Stop: demands hold at the commanded angles even as the source moves
    let (dems, report) = mgr
        .proc(&input(
            Some(left_upper_yaw_pose(-60.0)),
            Some(RetargetCmd::Stop),
            0.02,
        ))
        .unwrap();
    assert!(report.stopped);
    assert!((dems.joints[&JointId::LShoulderPitch].target_deg - 25.0).abs() < 1e-9);

    // A mode command releases the hold
    let (dems, report) = mgr
        .proc(&input(
            Some(left_upper_yaw_pose(-60.0)),
            Some(RetargetCmd::SetMode {
                mode: ControlMode::SingleJoint,
            }),
            0.04,
        ))
        .unwrap();
    assert!(!report.stopped);
    assert!((dems.joints[&JointId::LShoulderPitch].target_deg + 60.0).abs() < 1e-9);
}

#[test]
fn mode_cycles_in_fixed_order() {
    let mut mgr = RetargetMgr::from_params(test_params()).unwrap();

    assert_eq!(mgr.mode(), ControlMode::SingleJoint);

    for expected in [ControlMode::Ik, ControlMode::Hybrid, ControlMode::SingleJoint].iter() {
        mgr.proc(&input(None, Some(RetargetCmd::CycleMode), 0.0))
            .unwrap();
        assert_eq!(mgr.mode(), *expected);
    }
}
