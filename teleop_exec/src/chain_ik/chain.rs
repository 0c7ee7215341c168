//! Implementations for the cached chain model and forward kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Unit, UnitQuaternion, Vector3};

// Internal
use super::{ChainError, ChainGeom};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One joint of a cached chain model.
#[derive(Debug, Clone)]
pub struct ChainJoint {
    /// Rotation axis in the joint's reference frame.
    axis: Unit<Vector3<f64>>,

    /// Cached offset from this joint's origin to the next joint's origin
    /// (or to the end-effector for the last joint), expressed in this
    /// joint's reference frame.
    ///
    /// Units: meters
    link_offset_m: Vector3<f64>,

    /// Minimum joint angle.
    ///
    /// Units: degrees
    min_deg: f64,

    /// Maximum joint angle.
    ///
    /// Units: degrees
    max_deg: f64,
}

/// A cached kinematic model of one serial revolute chain.
///
/// Built once from the reference-pose geometry and treated as read-only by
/// all forward and inverse kinematics calls. If the physical layout changes
/// the model must be rebuilt with [`ChainModel::new`] before the next solve,
/// otherwise kinematics will silently compute against stale geometry.
#[derive(Debug, Clone)]
pub struct ChainModel {
    /// World position of the root joint.
    root_pos_m: Vector3<f64>,

    /// World position of the base frame origin.
    base_pos_m: Vector3<f64>,

    /// Orientation of the base frame, the initial orientation of the FK
    /// accumulation.
    base_rot: UnitQuaternion<f64>,

    /// The joints of the chain, ordered base to end-effector.
    joints: Vec<ChainJoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChainModel {
    /// Build a chain model from reference-pose geometry, caching the link
    /// offsets.
    ///
    /// Building is idempotent: the same geometry always yields the same
    /// cached offsets.
    pub fn new(geom: &ChainGeom) -> Result<Self, ChainError> {
        let n = geom.joint_pos_m.len();

        if n == 0 {
            return Err(ChainError::EmptyChain);
        }

        if geom.joint_axis.len() != n
            || geom.joint_min_deg.len() != n
            || geom.joint_max_deg.len() != n
        {
            return Err(ChainError::MismatchedGeomLengths {
                num_joints: n,
                num_axes: geom.joint_axis.len(),
                num_min: geom.joint_min_deg.len(),
                num_max: geom.joint_max_deg.len(),
            });
        }

        let base_rot = UnitQuaternion::from_euler_angles(
            geom.base_rot_deg[0].to_radians(),
            geom.base_rot_deg[1].to_radians(),
            geom.base_rot_deg[2].to_radians(),
        );

        let mut joints = Vec::with_capacity(n);

        for i in 0..n {
            let axis = Vector3::from(geom.joint_axis[i]);
            if axis.norm() < 1e-9 {
                return Err(ChainError::ZeroLengthAxis(i));
            }

            // Offset to the next joint, or to the end-effector for the last
            // joint, expressed in this joint's reference frame
            let next = if i + 1 < n {
                Vector3::from(geom.joint_pos_m[i + 1])
            } else {
                Vector3::from(geom.effector_pos_m)
            };
            let offset_world = next - Vector3::from(geom.joint_pos_m[i]);

            joints.push(ChainJoint {
                axis: Unit::new_normalize(axis),
                link_offset_m: base_rot.inverse_transform_vector(&offset_world),
                min_deg: geom.joint_min_deg[i],
                max_deg: geom.joint_max_deg[i],
            });
        }

        Ok(ChainModel {
            root_pos_m: Vector3::from(geom.joint_pos_m[0]),
            base_pos_m: Vector3::from(geom.base_pos_m),
            base_rot,
            joints,
        })
    }

    /// The number of joints in the chain.
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// World position of the end-effector for the given angle vector.
    ///
    /// A pure function of the angles and the cached geometry.
    pub fn effector_position(&self, angles_deg: &[f64]) -> Vector3<f64> {
        self.accumulate(angles_deg, self.joints.len()).0
    }

    /// World position of joint `i` for the given angle vector.
    pub fn joint_position(&self, angles_deg: &[f64], i: usize) -> Vector3<f64> {
        self.accumulate(angles_deg, i).0
    }

    /// World orientation of joint `i`'s frame for the given angle vector,
    /// including joint `i`'s own rotation.
    pub fn joint_rotation(&self, angles_deg: &[f64], i: usize) -> UnitQuaternion<f64> {
        self.accumulate(angles_deg, i + 1).1
    }

    /// World-space rotation axis of joint `i` for the given angle vector.
    ///
    /// Each joint's axis is itself rotated by all upstream joints, so the
    /// axis depends on the angle vector.
    pub fn joint_world_axis(&self, angles_deg: &[f64], i: usize) -> Unit<Vector3<f64>> {
        let rot = self.accumulate(angles_deg, i).1;
        Unit::new_normalize(rot * self.joints[i].axis.into_inner())
    }

    /// Angle limits of joint `i`.
    ///
    /// Units: degrees
    pub fn joint_limits_deg(&self, i: usize) -> (f64, f64) {
        (self.joints[i].min_deg, self.joints[i].max_deg)
    }

    /// The cached link offsets, in joint reference frames.
    pub fn link_offsets_m(&self) -> Vec<Vector3<f64>> {
        self.joints.iter().map(|j| j.link_offset_m).collect()
    }

    /// Position of the base frame origin in the world frame.
    pub fn base_pos_m(&self) -> Vector3<f64> {
        self.base_pos_m
    }

    /// Orientation of the base frame.
    pub fn base_rot(&self) -> UnitQuaternion<f64> {
        self.base_rot
    }

    /// Run the FK recurrence over the first `upto` joints.
    ///
    /// Returns the world position reached after advancing over those joints
    /// (i.e. the position of joint `upto`, or of the end-effector when
    /// `upto` equals the joint count) and the accumulated orientation.
    ///
    /// Angles are extrinsic rotations about each joint's instantaneous world
    /// axis, pre-multiplied so later joints inherit all prior rotations.
    fn accumulate(&self, angles_deg: &[f64], upto: usize) -> (Vector3<f64>, UnitQuaternion<f64>) {
        let mut pos = self.root_pos_m;
        let mut rot = self.base_rot;

        for (i, joint) in self.joints.iter().take(upto).enumerate() {
            let axis_world = Unit::new_normalize(rot * joint.axis.into_inner());
            rot = UnitQuaternion::from_axis_angle(&axis_world, angles_deg[i].to_radians()) * rot;
            pos += rot * joint.link_offset_m;
        }

        (pos, rot)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Two-joint planar chain: links of 0.3 m and 0.2 m along X, both
    /// rotating about Z.
    fn planar_two_link() -> ChainGeom {
        ChainGeom {
            base_pos_m: [0.0; 3],
            base_rot_deg: [0.0; 3],
            joint_pos_m: vec![[0.0, 0.0, 0.0], [0.3, 0.0, 0.0]],
            joint_axis: vec![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
            joint_min_deg: vec![-180.0, -180.0],
            joint_max_deg: vec![180.0, 180.0],
            effector_pos_m: [0.5, 0.0, 0.0],
        }
    }

    #[test]
    fn test_cache_idempotent() {
        let geom = planar_two_link();

        let a = ChainModel::new(&geom).unwrap();
        let b = ChainModel::new(&geom).unwrap();

        assert_eq!(a.link_offsets_m(), b.link_offsets_m());
    }

    #[test]
    fn test_fk_deterministic() {
        let model = ChainModel::new(&planar_two_link()).unwrap();
        let angles = [23.7, -48.2];

        let p0 = model.effector_position(&angles);
        let p1 = model.effector_position(&angles);

        // Bit-for-bit equal: FK is a pure function of angles and cache
        assert_eq!(p0, p1);
    }

    #[test]
    fn test_fk_reference_pose() {
        let model = ChainModel::new(&planar_two_link()).unwrap();

        let eff = model.effector_position(&[0.0, 0.0]);
        assert!((eff - Vector3::new(0.5, 0.0, 0.0)).norm() < 1e-12);

        assert!((model.joint_position(&[0.0, 0.0], 1) - Vector3::new(0.3, 0.0, 0.0)).norm()
            < 1e-12);
    }

    #[test]
    fn test_fk_bent_poses() {
        let model = ChainModel::new(&planar_two_link()).unwrap();

        // Base joint at 90 degrees folds the whole chain onto +Y
        let eff = model.effector_position(&[90.0, 0.0]);
        assert!((eff - Vector3::new(0.0, 0.5, 0.0)).norm() < 1e-9);

        // Counter-rotating the elbow points the second link back along +X
        let eff = model.effector_position(&[90.0, -90.0]);
        assert!((eff - Vector3::new(0.2, 0.3, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_truncated_recurrence() {
        let model = ChainModel::new(&planar_two_link()).unwrap();
        let angles = [90.0, 0.0];

        // Joint 1's frame inherits the base joint's rotation: its X axis
        // points along world +Y
        let rot = model.joint_rotation(&angles, 1);
        assert!((rot * Vector3::x() - Vector3::y()).norm() < 1e-9);

        // Both joint axes stay on +Z for a planar chain regardless of the
        // angle vector
        let axis = model.joint_world_axis(&angles, 1);
        assert!((axis.into_inner() - Vector3::z()).norm() < 1e-9);
    }

    #[test]
    fn test_geometry_validation() {
        let mut geom = planar_two_link();
        geom.joint_axis = vec![[0.0, 0.0, 1.0]];
        assert!(matches!(
            ChainModel::new(&geom),
            Err(ChainError::MismatchedGeomLengths { .. })
        ));

        let mut geom = planar_two_link();
        geom.joint_axis[1] = [0.0, 0.0, 0.0];
        assert!(matches!(
            ChainModel::new(&geom),
            Err(ChainError::ZeroLengthAxis(1))
        ));

        let geom = ChainGeom::default();
        assert!(matches!(ChainModel::new(&geom), Err(ChainError::EmptyChain)));
    }
}
