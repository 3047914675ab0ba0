//! Auxiliary constraint: prefer solutions close to the seed.

use nalgebra::{DMatrix, DVector};
use crate::constraint::{Constraint, ConstraintResidual};
use crate::errors::IkError;
use crate::parameters::ConstraintParams;
use crate::solver_state::SolverState;

/// Weighted pull of every joint back toward its seed value. On a redundant
/// chain this settles the null space on the configuration nearest to where
/// the motion started instead of letting it drift.
pub struct MinimizeChange {
    pub weight: f64,
}

impl Default for MinimizeChange {
    fn default() -> Self {
        MinimizeChange { weight: 1.0 }
    }
}

impl MinimizeChange {
    pub fn new() -> Self {
        MinimizeChange::default()
    }

    /// Options: `weight`.
    pub fn from_params(params: &ConstraintParams) -> Result<Self, IkError> {
        let weight = params.f64_or("weight", 1.0)?;
        Ok(MinimizeChange { weight })
    }
}

impl Constraint for MinimizeChange {
    fn name(&self) -> &str {
        "minimize_change"
    }

    fn evaluate(&self, state: &SolverState) -> Result<ConstraintResidual, IkError> {
        let dof = state.dof();
        let error = (&state.joint_seed - &state.joints) * self.weight;
        let jacobian = DMatrix::from_diagonal_element(dof, dof, self.weight);
        Ok(ConstraintResidual { error, jacobian })
    }

    /// Meant for the auxiliary tier: there is no distance from the seed
    /// that would be wrong, only less preferred.
    fn is_satisfied(&self, _state: &SolverState) -> bool {
        true
    }
}
