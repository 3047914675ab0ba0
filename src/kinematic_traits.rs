extern crate nalgebra as na;

use na::{DVector, Isometry3, Matrix6xX};
use crate::errors::IkError;

/// Joint positions of the chain, one value per actuated joint (radians for
/// revolute joints, meters for prismatic ones). The length is fixed by the
/// kinematics implementation and checked on every call that takes joints.
pub type Joints = DVector<f64>;

/// Pose is used as a pose of a chain link or the tip. It contains both
/// Cartesian position and rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.0);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Travel range of a single joint. Infinite bounds mean the joint is
/// unconstrained (a continuous joint).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimit {
    pub min: f64,
    pub max: f64,
}

impl JointLimit {
    /// Creates the limit, min must not exceed max.
    pub fn new(min: f64, max: f64) -> Self {
        assert!(min <= max, "Joint limit with min {} above max {}", min, max);
        JointLimit { min, max }
    }

    /// A limit that does not restrict the joint at all.
    pub fn unbounded() -> Self {
        JointLimit {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Value moved to the nearest point of the range. Identity for values
    /// already inside.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// True when both bounds are finite, so zone calculations make sense.
    pub fn is_bounded(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

/// Forward kinematics and differential kinematics of a joint chain. The
/// solver works against this trait only; any chain representation that can
/// produce link poses and the tip Jacobian can drive it. Implementations
/// can be cascaded (see Tool and Base in tool.rs).
pub trait Kinematics: Send + Sync {
    /// Number of actuated joints.
    fn dof(&self) -> usize;

    /// Poses of all links for the given joint positions, ordered from the
    /// link closest to the base to the tip.
    fn link_poses(&self, joints: &Joints) -> Result<Vec<Pose>, IkError>;

    /// Pose of the chain tip. The default takes the last of `link_poses`;
    /// implementations usually have a cheaper direct path.
    fn forward(&self, joints: &Joints) -> Result<Pose, IkError> {
        let mut poses = self.link_poses(joints)?;
        Ok(poses.pop().unwrap_or_else(Pose::identity))
    }

    /// Geometric Jacobian of the tip, 6 rows by DOF columns. Rows 0..3 map
    /// joint velocities to linear tip velocity, rows 3..6 to angular
    /// velocity, both expressed in the world frame.
    fn jacobian(&self, joints: &Joints) -> Result<Matrix6xX<f64>, IkError>;

    /// Travel ranges, one entry per joint.
    fn joint_limits(&self) -> &[JointLimit];
}

/// Checks a joint vector against the expected chain size.
pub(crate) fn check_dof(expected: usize, joints: &Joints) -> Result<(), IkError> {
    if joints.len() != expected {
        return Err(IkError::DimensionMismatch {
            expected,
            found: joints.len(),
        });
    }
    Ok(())
}
