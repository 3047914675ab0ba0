//! Primary task constraint: drive the tip position onto the goal position.

use nalgebra::{DMatrix, DVector, Vector3};
use crate::constraint::{Constraint, ConstraintResidual};
use crate::errors::IkError;
use crate::parameters::ConstraintParams;
use crate::solver_state::SolverState;

/// Cartesian position error between the tip and the goal, weighted per
/// axis. Three rows against the linear block of the chain Jacobian.
pub struct GoalPosition {
    /// Per axis scaling of the error and its Jacobian rows.
    pub weight: Vector3<f64>,
    /// Satisfied when the unweighted distance to the goal is below this,
    /// meters.
    pub tolerance: f64,
}

pub const DEFAULT_POSITION_TOLERANCE: f64 = 1e-3;

impl Default for GoalPosition {
    fn default() -> Self {
        GoalPosition {
            weight: Vector3::new(1.0, 1.0, 1.0),
            tolerance: DEFAULT_POSITION_TOLERANCE,
        }
    }
}

impl GoalPosition {
    pub fn new() -> Self {
        GoalPosition::default()
    }

    /// Options: `weight` (number or list of three), `tolerance`.
    pub fn from_params(params: &ConstraintParams) -> Result<Self, IkError> {
        let defaults = GoalPosition::default();
        let weight = params.vector3_or("weight", defaults.weight)?;
        let tolerance = params.f64_or("tolerance", defaults.tolerance)?;
        if tolerance <= 0.0 {
            return Err(IkError::InvalidParameter(format!(
                "goal_position tolerance must be positive, got {}",
                tolerance
            )));
        }
        Ok(GoalPosition { weight, tolerance })
    }

    fn position_error(&self, state: &SolverState) -> Vector3<f64> {
        state.goal.translation.vector - state.tip_pose.translation.vector
    }
}

impl Constraint for GoalPosition {
    fn name(&self) -> &str {
        "goal_position"
    }

    fn evaluate(&self, state: &SolverState) -> Result<ConstraintResidual, IkError> {
        let raw = self.position_error(state);
        let error = DVector::from_row_slice(&[
            self.weight.x * raw.x,
            self.weight.y * raw.y,
            self.weight.z * raw.z,
        ]);

        // Linear rows of the chain Jacobian, one weight per row
        let dof = state.dof();
        let mut jacobian = DMatrix::zeros(3, dof);
        for c in 0..dof {
            for r in 0..3 {
                jacobian[(r, c)] = self.weight[r] * state.jacobian[(r, c)];
            }
        }

        Ok(ConstraintResidual { error, jacobian })
    }

    fn is_satisfied(&self, state: &SolverState) -> bool {
        self.position_error(state).norm() <= self.tolerance
    }
}
