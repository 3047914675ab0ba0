//! Ordered collection of constraints in two priority tiers, and the
//! stacked linear system built from them each iteration.

use nalgebra::{DMatrix, DVector};
use crate::constraint::{Constraint, ConstraintResidual, ConstraintTier};
use crate::errors::IkError;
use crate::kinematic_traits::Joints;
use crate::solver_state::SolverState;

/// The constraints driving one solver. Insertion order is kept within each
/// tier and decides the row order of the stacked system, so results are
/// reproducible run to run.
#[derive(Default)]
pub struct ConstraintSet {
    pub primary: Vec<Box<dyn Constraint>>,
    pub auxiliary: Vec<Box<dyn Constraint>>,
}

/// All constraint rows concatenated: primary block on top, auxiliary rows
/// below, both in insertion order.
pub struct StackedSystem {
    pub error: DVector<f64>,
    pub jacobian: DMatrix<f64>,
    /// Rows 0..primary_rows belong to the primary tier.
    pub primary_rows: usize,
}

impl StackedSystem {
    pub fn rows(&self) -> usize {
        self.error.len()
    }

    /// Largest absolute residual in the primary block; 0.0 when the
    /// primary constraints contributed no rows at all.
    pub fn max_primary_error(&self) -> f64 {
        self.error
            .rows(0, self.primary_rows)
            .iter()
            .fold(0.0, |acc: f64, e| acc.max(e.abs()))
    }
}

impl ConstraintSet {
    pub fn new() -> Self {
        ConstraintSet::default()
    }

    pub fn add(&mut self, constraint: Box<dyn Constraint>, tier: ConstraintTier) {
        match tier {
            ConstraintTier::Primary => self.primary.push(constraint),
            ConstraintTier::Auxiliary => self.auxiliary.push(constraint),
        }
    }

    /// Evaluates every constraint at the given state and concatenates the
    /// blocks. Fails with `EmptyConstraintSet` when there is no primary
    /// constraint: auxiliary rows alone cannot define convergence.
    pub fn build_system(&self, state: &SolverState) -> Result<StackedSystem, IkError> {
        if self.primary.is_empty() {
            return Err(IkError::EmptyConstraintSet);
        }
        let dof = state.dof();

        let mut blocks: Vec<ConstraintResidual> =
            Vec::with_capacity(self.primary.len() + self.auxiliary.len());
        let mut primary_rows = 0;
        for constraint in &self.primary {
            let block = constraint.evaluate(state)?;
            block.check(dof)?;
            primary_rows += block.rows();
            blocks.push(block);
        }
        for constraint in &self.auxiliary {
            let block = constraint.evaluate(state)?;
            block.check(dof)?;
            blocks.push(block);
        }

        let total: usize = blocks.iter().map(|b| b.rows()).sum();
        let mut error = DVector::zeros(total);
        let mut jacobian = DMatrix::zeros(total, dof);
        let mut row = 0;
        for block in blocks {
            let rows = block.rows();
            error.rows_mut(row, rows).copy_from(&block.error);
            jacobian
                .view_mut((row, 0), (rows, dof))
                .copy_from(&block.jacobian);
            row += rows;
        }

        Ok(StackedSystem {
            error,
            jacobian,
            primary_rows,
        })
    }

    /// True when every primary constraint reports its tolerance met.
    pub fn primary_satisfied(&self, state: &SolverState) -> bool {
        self.primary.iter().all(|c| c.is_satisfied(state))
    }

    /// Runs every clip hook against the proposed step, primary tier first.
    /// Returns true if any of them changed it.
    pub fn clip_update(&self, state: &SolverState, delta: &mut Joints) -> bool {
        let mut modified = false;
        for constraint in self.primary.iter().chain(self.auxiliary.iter()) {
            modified |= constraint.clip_update(state, delta);
        }
        modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::Pose;
    use crate::utils::joints;

    /// Emits a fixed residual so stacking order is visible in the output.
    struct Tagged {
        tag: f64,
        rows: usize,
        cols: usize,
    }

    impl Constraint for Tagged {
        fn name(&self) -> &str {
            "tagged"
        }

        fn evaluate(&self, _state: &SolverState) -> Result<ConstraintResidual, IkError> {
            Ok(ConstraintResidual {
                error: DVector::from_element(self.rows, self.tag),
                jacobian: DMatrix::from_element(self.rows, self.cols, self.tag),
            })
        }

        fn is_satisfied(&self, _state: &SolverState) -> bool {
            self.tag.abs() < 0.5
        }
    }

    fn state_with_dof(dof: usize) -> SolverState {
        SolverState::new(&Pose::identity(), &joints(&vec![0.0; dof]), &[])
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let set = ConstraintSet::new();
        let state = state_with_dof(2);
        assert!(matches!(
            set.build_system(&state),
            Err(IkError::EmptyConstraintSet)
        ));

        // Auxiliary constraints alone do not help
        let mut set = ConstraintSet::new();
        set.add(
            Box::new(Tagged { tag: 1.0, rows: 1, cols: 2 }),
            ConstraintTier::Auxiliary,
        );
        assert!(matches!(
            set.build_system(&state),
            Err(IkError::EmptyConstraintSet)
        ));
    }

    #[test]
    fn test_stacking_order_and_primary_rows() {
        let mut set = ConstraintSet::new();
        set.add(
            Box::new(Tagged { tag: 1.0, rows: 2, cols: 3 }),
            ConstraintTier::Primary,
        );
        set.add(
            Box::new(Tagged { tag: 3.0, rows: 1, cols: 3 }),
            ConstraintTier::Auxiliary,
        );
        set.add(
            Box::new(Tagged { tag: 2.0, rows: 1, cols: 3 }),
            ConstraintTier::Primary,
        );

        let state = state_with_dof(3);
        let system = set.build_system(&state).unwrap();
        assert_eq!(system.rows(), 4);
        assert_eq!(system.primary_rows, 3);
        // Primary rows first in insertion order, auxiliary after
        assert_eq!(system.error[0], 1.0);
        assert_eq!(system.error[1], 1.0);
        assert_eq!(system.error[2], 2.0);
        assert_eq!(system.error[3], 3.0);
        assert_eq!(system.jacobian[(3, 0)], 3.0);
        // Auxiliary magnitude stays out of the primary error
        assert_eq!(system.max_primary_error(), 2.0);
    }

    #[test]
    fn test_wrong_column_count_is_caught() {
        let mut set = ConstraintSet::new();
        set.add(
            Box::new(Tagged { tag: 1.0, rows: 1, cols: 5 }),
            ConstraintTier::Primary,
        );
        let state = state_with_dof(3);
        assert!(matches!(
            set.build_system(&state),
            Err(IkError::DimensionMismatch { expected: 3, found: 5 })
        ));
    }

    #[test]
    fn test_primary_satisfied_ignores_auxiliary() {
        let mut set = ConstraintSet::new();
        set.add(
            Box::new(Tagged { tag: 0.1, rows: 1, cols: 2 }),
            ConstraintTier::Primary,
        );
        // Auxiliary never satisfied, must not matter
        set.add(
            Box::new(Tagged { tag: 9.0, rows: 1, cols: 2 }),
            ConstraintTier::Auxiliary,
        );
        let state = state_with_dof(2);
        assert!(set.primary_satisfied(&state));
    }
}
