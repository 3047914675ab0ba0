//! Primary task constraint: align the tip orientation with the goal.

use nalgebra::{DMatrix, DVector, Vector3};
use crate::constraint::{Constraint, ConstraintResidual};
use crate::errors::IkError;
use crate::parameters::ConstraintParams;
use crate::solver_state::SolverState;

/// Orientation error between the tip and the goal as a world frame
/// rotation vector, weighted per axis. Three rows against the angular
/// block of the chain Jacobian.
pub struct GoalOrientation {
    pub weight: Vector3<f64>,
    /// Satisfied when the angle between tip and goal rotations is below
    /// this, radians.
    pub tolerance: f64,
}

pub const DEFAULT_ORIENTATION_TOLERANCE: f64 = 9e-3;

impl Default for GoalOrientation {
    fn default() -> Self {
        GoalOrientation {
            weight: Vector3::new(1.0, 1.0, 1.0),
            tolerance: DEFAULT_ORIENTATION_TOLERANCE,
        }
    }
}

impl GoalOrientation {
    pub fn new() -> Self {
        GoalOrientation::default()
    }

    /// Options: `weight` (number or list of three), `tolerance`.
    pub fn from_params(params: &ConstraintParams) -> Result<Self, IkError> {
        let defaults = GoalOrientation::default();
        let weight = params.vector3_or("weight", defaults.weight)?;
        let tolerance = params.f64_or("tolerance", defaults.tolerance)?;
        if tolerance <= 0.0 {
            return Err(IkError::InvalidParameter(format!(
                "goal_orientation tolerance must be positive, got {}",
                tolerance
            )));
        }
        Ok(GoalOrientation { weight, tolerance })
    }

    /// Rotation taking the tip onto the goal, as a scaled axis in the
    /// world frame. Matches the convention of the angular Jacobian rows.
    fn rotation_error(&self, state: &SolverState) -> Vector3<f64> {
        (state.goal.rotation * state.tip_pose.rotation.inverse()).scaled_axis()
    }
}

impl Constraint for GoalOrientation {
    fn name(&self) -> &str {
        "goal_orientation"
    }

    fn evaluate(&self, state: &SolverState) -> Result<ConstraintResidual, IkError> {
        let raw = self.rotation_error(state);
        let error = DVector::from_row_slice(&[
            self.weight.x * raw.x,
            self.weight.y * raw.y,
            self.weight.z * raw.z,
        ]);

        // Angular rows of the chain Jacobian, one weight per row
        let dof = state.dof();
        let mut jacobian = DMatrix::zeros(3, dof);
        for c in 0..dof {
            for r in 0..3 {
                jacobian[(r, c)] = self.weight[r] * state.jacobian[(r + 3, c)];
            }
        }

        Ok(ConstraintResidual { error, jacobian })
    }

    fn is_satisfied(&self, state: &SolverState) -> bool {
        state.tip_pose.rotation.angle_to(&state.goal.rotation) <= self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SerialChain;
    use crate::kinematic_traits::{Kinematics, Pose};
    use crate::utils::joints;
    use nalgebra::{Translation3, UnitQuaternion};
    use std::f64::consts::FRAC_PI_4;

    fn state_for(chain: &SerialChain, q: &[f64], goal: &Pose) -> SolverState {
        let q = joints(q);
        let mut state = SolverState::new(goal, &q, chain.joint_limits());
        state.tip_pose = chain.forward(&q).unwrap();
        state.jacobian = chain.jacobian(&q).unwrap();
        state
    }

    #[test]
    fn test_rotation_error_axis_and_magnitude() {
        let chain = SerialChain::planar(&[1.0]);
        // Goal turned 45 degrees around z relative to the tip at zero
        let goal = Pose::from_parts(
            Translation3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4),
        );
        let state = state_for(&chain, &[0.0], &goal);

        let constraint = GoalOrientation::new();
        let block = constraint.evaluate(&state).unwrap();
        assert_eq!(block.rows(), 3);
        assert!((block.error[0] - 0.0).abs() < 1e-12);
        assert!((block.error[1] - 0.0).abs() < 1e-12);
        assert!((block.error[2] - FRAC_PI_4).abs() < 1e-12);
        // The single z revolute joint is fully observed by the z row
        assert!((block.jacobian[(2, 0)] - 1.0).abs() < 1e-12);
        assert!(!constraint.is_satisfied(&state));
    }

    #[test]
    fn test_satisfied_when_aligned() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let at = joints(&[0.3, -0.5]);
        let goal = chain.forward(&at).unwrap();
        let state = state_for(&chain, &[0.3, -0.5], &goal);
        assert!(GoalOrientation::new().is_satisfied(&state));
    }
}
