//! The capability contract of a constraint. The solver only sees this
//! trait; what a constraint measures and how it maps that onto the joints
//! is entirely its own business.

use nalgebra::{DMatrix, DVector};
use crate::errors::IkError;
use crate::kinematic_traits::Joints;
use crate::solver_state::SolverState;

/// Where in the priority stack a constraint participates.
///
/// Primary constraints define the task and gate convergence. Auxiliary
/// constraints are best effort: their rows are stacked below the primary
/// block and shape the null space behavior, but they never hold up
/// convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintTier {
    Primary,
    Auxiliary,
}

impl ConstraintTier {
    /// The tier encoded the way configuration files carry it.
    pub fn from_primary_flag(primary: bool) -> Self {
        if primary {
            ConstraintTier::Primary
        } else {
            ConstraintTier::Auxiliary
        }
    }
}

/// Residual and Jacobian block one constraint contributes to the stacked
/// system. Row count is the constraint's own choice but must stay fixed
/// for the lifetime of the instance; the column count is always the DOF of
/// the chain.
#[derive(Debug, Clone)]
pub struct ConstraintResidual {
    /// How far the constraint is from satisfied, one value per row.
    pub error: DVector<f64>,
    /// Partial derivatives of the error rows with respect to the joints.
    pub jacobian: DMatrix<f64>,
}

impl ConstraintResidual {
    pub fn rows(&self) -> usize {
        self.error.len()
    }

    /// Internal consistency and chain size check, run on every block
    /// before it is stacked.
    pub(crate) fn check(&self, dof: usize) -> Result<(), IkError> {
        if self.jacobian.nrows() != self.error.len() {
            return Err(IkError::DimensionMismatch {
                expected: self.error.len(),
                found: self.jacobian.nrows(),
            });
        }
        if self.jacobian.ncols() != dof {
            return Err(IkError::DimensionMismatch {
                expected: dof,
                found: self.jacobian.ncols(),
            });
        }
        Ok(())
    }
}

/// A single constraint. Implementations carry their configuration
/// (weights, tolerances) set at construction time and are stateless across
/// solves otherwise, so one instance can serve any number of sequential
/// solves.
pub trait Constraint: Send + Sync {
    /// Short name used in configuration files and diagnostics.
    fn name(&self) -> &str;

    /// Residual and Jacobian block for the current iteration.
    fn evaluate(&self, state: &SolverState) -> Result<ConstraintResidual, IkError>;

    /// Tolerance check. Only consulted for primary tier constraints, as
    /// part of the convergence decision.
    fn is_satisfied(&self, state: &SolverState) -> bool;

    /// Optional veto on the proposed step: scale or pin components of
    /// `delta` before it is applied. Returns true when the step was
    /// modified. The default leaves the step alone.
    fn clip_update(&self, _state: &SolverState, _delta: &mut Joints) -> bool {
        false
    }
}
