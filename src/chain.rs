//! A serial chain of revolute and prismatic joints, providing forward
//! kinematics and the analytic geometric Jacobian. This is the stock
//! implementation of the Kinematics trait; anything that produces link
//! poses and a tip Jacobian can stand in for it.

extern crate nalgebra as na;

use na::{Matrix6xX, Translation3, Unit, UnitQuaternion, Vector3};
use crate::errors::IkError;
use crate::kinematic_traits::{check_dof, JointLimit, Joints, Kinematics, Pose};

/// How a joint moves relative to its origin frame.
#[derive(Debug, Clone, Copy)]
pub enum JointType {
    /// Rotation around the axis, radians.
    Revolute { axis: Unit<Vector3<f64>> },
    /// Translation along the axis, meters.
    Prismatic { axis: Unit<Vector3<f64>> },
}

/// One actuated joint of the chain.
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    /// Fixed transform from the previous joint frame to this joint frame.
    pub origin: Pose,
    pub joint_type: JointType,
    pub limit: JointLimit,
}

impl Joint {
    /// Motion transform of the joint at the given position.
    fn motion(&self, q: f64) -> Pose {
        match self.joint_type {
            JointType::Revolute { axis } => Pose::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&axis, q),
            ),
            JointType::Prismatic { axis } => Pose::from_parts(
                Translation3::from(axis.into_inner() * q),
                UnitQuaternion::identity(),
            ),
        }
    }

    fn axis(&self) -> Unit<Vector3<f64>> {
        match self.joint_type {
            JointType::Revolute { axis } => axis,
            JointType::Prismatic { axis } => axis,
        }
    }
}

/// Serial kinematic chain, base to tip.
/// ```
/// use rs_constrained_ik::chain::SerialChain;
/// use rs_constrained_ik::kinematic_traits::Kinematics;
/// use rs_constrained_ik::utils::joints;
///
/// // Two links of 1 m each, rotating in the x-y plane.
/// let chain = SerialChain::planar(&[1.0, 1.0]);
/// let tip = chain.forward(&joints(&[0.0, 0.0])).unwrap();
/// assert!((tip.translation.vector.x - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SerialChain {
    joints: Vec<Joint>,
    /// Fixed transform from the last joint frame to the tip.
    tip: Pose,
    limits: Vec<JointLimit>,
}

impl SerialChain {
    pub fn new(joints: Vec<Joint>, tip: Pose) -> Self {
        let limits = joints.iter().map(|j| j.limit).collect();
        SerialChain { joints, tip, limits }
    }

    /// A chain of revolute joints around the world z axis, link after link
    /// along the local x axis. The workhorse of the test suite: forward
    /// kinematics of such an arm can be written down by hand.
    pub fn planar(link_lengths: &[f64]) -> Self {
        let z = Vector3::z_axis();
        let mut joints = Vec::with_capacity(link_lengths.len());
        let mut origin = Pose::identity();
        for (i, length) in link_lengths.iter().enumerate() {
            joints.push(Joint {
                name: format!("joint_{}", i + 1),
                origin,
                joint_type: JointType::Revolute { axis: z },
                limit: JointLimit::unbounded(),
            });
            origin = Pose::translation(*length, 0.0, 0.0);
        }
        let tip = origin;
        SerialChain::new(joints, tip)
    }

    /// Replaces the joint limits, builder style.
    pub fn with_limits(mut self, limits: &[JointLimit]) -> Self {
        assert_eq!(
            limits.len(),
            self.joints.len(),
            "One limit per joint expected"
        );
        for (joint, limit) in self.joints.iter_mut().zip(limits.iter()) {
            joint.limit = *limit;
        }
        self.limits = limits.to_vec();
        self
    }

    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    /// World poses of every joint frame (after the joint motion is applied).
    fn joint_poses(&self, joints: &Joints) -> Vec<Pose> {
        let mut poses = Vec::with_capacity(self.joints.len());
        let mut current = Pose::identity();
        for (joint, q) in self.joints.iter().zip(joints.iter()) {
            current = current * joint.origin * joint.motion(*q);
            poses.push(current);
        }
        poses
    }
}

impl Kinematics for SerialChain {
    fn dof(&self) -> usize {
        self.joints.len()
    }

    fn link_poses(&self, joints: &Joints) -> Result<Vec<Pose>, IkError> {
        check_dof(self.dof(), joints)?;
        let mut poses = self.joint_poses(joints);
        let tip = poses.last().map(|last| last * self.tip).unwrap_or(self.tip);
        poses.push(tip);
        Ok(poses)
    }

    fn forward(&self, joints: &Joints) -> Result<Pose, IkError> {
        check_dof(self.dof(), joints)?;
        let mut current = Pose::identity();
        for (joint, q) in self.joints.iter().zip(joints.iter()) {
            current = current * joint.origin * joint.motion(*q);
        }
        Ok(current * self.tip)
    }

    fn jacobian(&self, joints: &Joints) -> Result<Matrix6xX<f64>, IkError> {
        check_dof(self.dof(), joints)?;
        let poses = self.joint_poses(joints);
        let tip_position = poses
            .last()
            .map(|last| (last * self.tip).translation.vector)
            .unwrap_or(self.tip.translation.vector);

        let mut jacobian = Matrix6xX::zeros(self.dof());
        for (i, (joint, pose)) in self.joints.iter().zip(poses.iter()).enumerate() {
            let world_axis = pose.rotation * joint.axis().into_inner();
            match joint.joint_type {
                JointType::Revolute { .. } => {
                    let linear = world_axis.cross(&(tip_position - pose.translation.vector));
                    jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&linear);
                    jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&world_axis);
                }
                JointType::Prismatic { .. } => {
                    jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&world_axis);
                    // No angular contribution from a sliding joint
                }
            }
        }
        Ok(jacobian)
    }

    fn joint_limits(&self) -> &[JointLimit] {
        &self.limits
    }
}
