//! Provides tool and base for the chain.
//! Both Tool and Base take an arbitrary implementation of Kinematics and are
//! such implementations themselves. Hence, they can be cascaded, like a base
//! holding a robot that carries a tool: the solver then drives the tool
//! center point instead of the bare flange, with the Jacobian adjusted
//! accordingly.

extern crate nalgebra as na;

use std::sync::Arc;
use na::{Isometry3, Matrix6xX};
use crate::errors::IkError;
use crate::kinematic_traits::{JointLimit, Joints, Kinematics, Pose};

/// Defines the fixed tool attached after the last joint of the chain. The
/// tool moves with the chain, providing additional translation and, if
/// needed, rotation. Poses reported by `forward` are poses of the tool
/// center point; Jacobian columns are shifted to that point.
#[derive(Clone)]
pub struct Tool {
    pub robot: Arc<dyn Kinematics>, // The chain

    /// Transformation from the tip of the chain to the tool center point.
    pub tool: Isometry3<f64>,
}

/// Defines the fixed base that holds the chain. The base moves the chain to
/// its installed location, rotating it if required (arms work fine upside
/// down or at an angle). Velocities rotate into the new world frame, so the
/// Jacobian blocks are rotated as well.
#[derive(Clone)]
pub struct Base {
    pub robot: Arc<dyn Kinematics>, // The chain

    /// Transformation from the world origin to the base of the chain.
    pub base: Isometry3<f64>,
}

impl Kinematics for Tool {
    fn dof(&self) -> usize {
        self.robot.dof()
    }

    fn link_poses(&self, joints: &Joints) -> Result<Vec<Pose>, IkError> {
        let mut poses = self.robot.link_poses(joints)?;
        if let Some(tip) = poses.last().copied() {
            poses.push(tip * self.tool);
        }
        Ok(poses)
    }

    fn forward(&self, joints: &Joints) -> Result<Pose, IkError> {
        Ok(self.robot.forward(joints)? * self.tool)
    }

    fn jacobian(&self, joints: &Joints) -> Result<Matrix6xX<f64>, IkError> {
        let inner = self.robot.jacobian(joints)?;
        let tip = self.robot.forward(joints)?;
        // Lever arm from the tip to the tool point, in the world frame
        let offset = tip.rotation * self.tool.translation.vector;

        let mut shifted = inner.clone();
        for c in 0..inner.ncols() {
            let linear = inner.fixed_view::<3, 1>(0, c).into_owned();
            let angular = inner.fixed_view::<3, 1>(3, c).into_owned();
            let moved = linear + angular.cross(&offset);
            shifted.fixed_view_mut::<3, 1>(0, c).copy_from(&moved);
        }
        Ok(shifted)
    }

    fn joint_limits(&self) -> &[JointLimit] {
        self.robot.joint_limits()
    }
}

impl Kinematics for Base {
    fn dof(&self) -> usize {
        self.robot.dof()
    }

    fn link_poses(&self, joints: &Joints) -> Result<Vec<Pose>, IkError> {
        let poses = self.robot.link_poses(joints)?;
        Ok(poses.into_iter().map(|pose| self.base * pose).collect())
    }

    fn forward(&self, joints: &Joints) -> Result<Pose, IkError> {
        Ok(self.base * self.robot.forward(joints)?)
    }

    fn jacobian(&self, joints: &Joints) -> Result<Matrix6xX<f64>, IkError> {
        let inner = self.robot.jacobian(joints)?;
        let rotation = self.base.rotation;

        let mut rotated = inner.clone();
        for c in 0..inner.ncols() {
            let linear = rotation * inner.fixed_view::<3, 1>(0, c).into_owned();
            let angular = rotation * inner.fixed_view::<3, 1>(3, c).into_owned();
            rotated.fixed_view_mut::<3, 1>(0, c).copy_from(&linear);
            rotated.fixed_view_mut::<3, 1>(3, c).copy_from(&angular);
        }
        Ok(rotated)
    }

    fn joint_limits(&self) -> &[JointLimit] {
        self.robot.joint_limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SerialChain;
    use crate::jacobian::numerical_jacobian;
    use crate::utils::joints;
    use na::{Translation3, UnitQuaternion, Vector3};
    use std::f64::consts::FRAC_PI_2;

    fn assert_jacobian_matches_numerical<K: Kinematics>(robot: &K, at: &Joints) {
        let analytic = robot.jacobian(at).unwrap();
        let numerical = numerical_jacobian(robot, at, 1e-7).unwrap();
        for r in 0..6 {
            for c in 0..analytic.ncols() {
                assert!(
                    (analytic[(r, c)] - numerical[(r, c)]).abs() < 1e-5,
                    "[{},{}]: analytic {} vs numerical {}",
                    r, c, analytic[(r, c)], numerical[(r, c)]
                );
            }
        }
    }

    #[test]
    fn test_tool_forward() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let with_tool = Tool {
            robot: Arc::new(chain),
            tool: Isometry3::translation(0.5, 0.0, 0.0),
        };

        let tip = with_tool.forward(&joints(&[0.0, 0.0])).unwrap();
        assert!((tip.translation.vector.x - 2.5).abs() < 1e-12);

        // Tool offset follows the rotation of the arm
        let tip = with_tool.forward(&joints(&[FRAC_PI_2, 0.0])).unwrap();
        assert!((tip.translation.vector.x - 0.0).abs() < 1e-12);
        assert!((tip.translation.vector.y - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_tool_jacobian_reference_point() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let with_tool = Tool {
            robot: Arc::new(chain),
            tool: Isometry3::translation(0.5, 0.0, 0.0),
        };

        // The lever arm of the first joint grows from 2.0 to 2.5
        let jacobian = with_tool.jacobian(&joints(&[0.0, 0.0])).unwrap();
        assert!((jacobian[(1, 0)] - 2.5).abs() < 1e-12);
        assert!((jacobian[(1, 1)] - 1.5).abs() < 1e-12);

        assert_jacobian_matches_numerical(&with_tool, &joints(&[0.4, -0.9]));
    }

    #[test]
    fn test_base_forward() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let on_base = Base {
            robot: Arc::new(chain),
            base: Isometry3::from_parts(
                Translation3::new(0.0, 0.0, 0.5),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            ),
        };

        let tip = on_base.forward(&joints(&[0.0, 0.0])).unwrap();
        assert!((tip.translation.vector.x - 0.0).abs() < 1e-12);
        assert!((tip.translation.vector.y - 2.0).abs() < 1e-12);
        assert!((tip.translation.vector.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_base_jacobian_rotates_with_the_base() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let on_base = Base {
            robot: Arc::new(chain),
            base: Isometry3::from_parts(
                Translation3::new(0.0, 0.0, 0.5),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            ),
        };

        // The y column of the plain chain becomes -x after the 90 degree base
        let jacobian = on_base.jacobian(&joints(&[0.0, 0.0])).unwrap();
        assert!((jacobian[(0, 0)] + 2.0).abs() < 1e-12);
        assert!((jacobian[(1, 0)] - 0.0).abs() < 1e-10);

        assert_jacobian_matches_numerical(&on_base, &joints(&[0.4, -0.9]));
    }

    #[test]
    fn test_cascaded_tool_on_base() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let with_tool = Tool {
            robot: Arc::new(chain),
            tool: Isometry3::translation(0.5, 0.0, 0.0),
        };
        let complete = Base {
            robot: Arc::new(with_tool),
            base: Isometry3::translation(0.0, 1.0, 0.0),
        };

        let tip = complete.forward(&joints(&[0.0, 0.0])).unwrap();
        assert!((tip.translation.vector.x - 2.5).abs() < 1e-12);
        assert!((tip.translation.vector.y - 1.0).abs() < 1e-12);

        // Three frames from the chain plus the tool point
        let poses = complete.link_poses(&joints(&[0.0, 0.0])).unwrap();
        assert_eq!(poses.len(), 4);

        assert_jacobian_matches_numerical(&complete, &joints(&[-0.3, 0.8]));
    }
}
