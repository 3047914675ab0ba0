//! The update filter stage. Iterative trajectory optimizers produce, on every
//! iteration, an update matrix that is added to the current trajectory
//! (one column per waypoint, one row per joint). Filters inspect or rewrite
//! that update before it is applied: clamping steps, logging, smoothing and
//! so on. Filters form a chain and run in order; each reports if it changed
//! anything.
//!
//! Only the waypoints in the window `start .. start + len` may be touched.
//! Endpoints of the trajectory are typically fixed, so the caller passes a
//! window that excludes them.

extern crate nalgebra as na;

use na::DMatrix;
use crate::errors::IkError;

/// Rewrites trajectory updates before they are applied.
///
/// The current trajectory is read-only; only the update may change. Both
/// matrices have one row per joint and one column per waypoint.
pub trait UpdateFilter: Send + Sync {
    /// Name under that the filter reports itself in logs.
    fn name(&self) -> &str;

    /// Inspect and possibly rewrite `update` for the waypoint window
    /// `start .. start + len`. `parameters` is the trajectory the update
    /// will be added to. Returns true if the update was modified.
    fn filter(
        &mut self,
        start: usize,
        len: usize,
        iteration: usize,
        parameters: &DMatrix<f64>,
        update: &mut DMatrix<f64>,
    ) -> Result<bool, IkError>;

    /// Called once after the optimizer finishes, successfully or not.
    /// Filters that hold resources (open files, buffers) release them here.
    fn done(&mut self, _success: bool, _iterations: usize, _cost: f64) {}
}

/// Checks that the waypoint window and the shapes of both matrices agree.
pub(crate) fn check_window(
    start: usize,
    len: usize,
    parameters: &DMatrix<f64>,
    update: &DMatrix<f64>,
) -> Result<(), IkError> {
    if parameters.nrows() != update.nrows() || parameters.ncols() != update.ncols() {
        return Err(IkError::DimensionMismatch {
            expected: parameters.ncols(),
            found: update.ncols(),
        });
    }
    let end = start.checked_add(len).unwrap_or(usize::MAX);
    if end > update.ncols() {
        return Err(IkError::DimensionMismatch {
            expected: update.ncols(),
            found: end,
        });
    }
    Ok(())
}

/// Runs several filters in sequence over the same update. The chain reports
/// a modification if any member modified the update, and forwards `done` to
/// every member.
#[derive(Default)]
pub struct FilterChain {
    pub filters: Vec<Box<dyn UpdateFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        FilterChain { filters: Vec::new() }
    }

    /// Appends a filter to the end of the chain.
    pub fn add(&mut self, filter: Box<dyn UpdateFilter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl UpdateFilter for FilterChain {
    fn name(&self) -> &str {
        "filter_chain"
    }

    fn filter(
        &mut self,
        start: usize,
        len: usize,
        iteration: usize,
        parameters: &DMatrix<f64>,
        update: &mut DMatrix<f64>,
    ) -> Result<bool, IkError> {
        check_window(start, len, parameters, update)?;
        let mut modified = false;
        for filter in self.filters.iter_mut() {
            modified |= filter.filter(start, len, iteration, parameters, update)?;
        }
        Ok(modified)
    }

    fn done(&mut self, success: bool, iterations: usize, cost: f64) {
        for filter in self.filters.iter_mut() {
            filter.done(success, iterations, cost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adds a constant to every element of the window.
    struct Nudge {
        amount: f64,
    }

    impl Nudge {
        fn new(amount: f64) -> Self {
            Nudge { amount }
        }
    }

    impl UpdateFilter for Nudge {
        fn name(&self) -> &str {
            "nudge"
        }

        fn filter(
            &mut self,
            start: usize,
            len: usize,
            _iteration: usize,
            parameters: &DMatrix<f64>,
            update: &mut DMatrix<f64>,
        ) -> Result<bool, IkError> {
            check_window(start, len, parameters, update)?;
            if self.amount == 0.0 {
                return Ok(false);
            }
            for c in start..start + len {
                for r in 0..update.nrows() {
                    update[(r, c)] += self.amount;
                }
            }
            Ok(true)
        }
    }

    #[test]
    fn test_chain_applies_in_order_and_ors_flags() {
        let mut chain = FilterChain::new();
        chain.add(Box::new(Nudge::new(0.0)));
        chain.add(Box::new(Nudge::new(1.0)));

        let parameters = DMatrix::zeros(2, 4);
        let mut update = DMatrix::zeros(2, 4);
        let modified = chain.filter(1, 2, 0, &parameters, &mut update).unwrap();

        assert!(modified, "the second filter modified the update");
        assert_eq!(update[(0, 0)], 0.0, "outside the window");
        assert_eq!(update[(0, 1)], 1.0);
        assert_eq!(update[(1, 2)], 1.0);
        assert_eq!(update[(0, 3)], 0.0, "outside the window");
    }

    #[test]
    fn test_chain_with_no_modifications() {
        let mut chain = FilterChain::new();
        chain.add(Box::new(Nudge::new(0.0)));

        let parameters = DMatrix::zeros(2, 4);
        let mut update = DMatrix::zeros(2, 4);
        assert!(!chain.filter(0, 4, 0, &parameters, &mut update).unwrap());
    }

    #[test]
    fn test_window_out_of_range() {
        let mut chain = FilterChain::new();
        let parameters = DMatrix::zeros(2, 4);
        let mut update = DMatrix::zeros(2, 4);

        let result = chain.filter(2, 3, 0, &parameters, &mut update);
        match result {
            Err(IkError::DimensionMismatch { expected, found }) => {
                assert_eq!(expected, 4);
                assert_eq!(found, 5);
            }
            other => panic!("expected a window error, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let mut chain = FilterChain::new();
        let parameters = DMatrix::zeros(2, 4);
        let mut update = DMatrix::zeros(2, 3);
        assert!(chain.filter(0, 3, 0, &parameters, &mut update).is_err());
    }

    #[test]
    fn test_done_forwarded_to_members() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingDone {
            counter: Arc<AtomicUsize>,
        }

        impl UpdateFilter for CountingDone {
            fn name(&self) -> &str {
                "counting_done"
            }

            fn filter(
                &mut self,
                _start: usize,
                _len: usize,
                _iteration: usize,
                _parameters: &DMatrix<f64>,
                _update: &mut DMatrix<f64>,
            ) -> Result<bool, IkError> {
                Ok(false)
            }

            fn done(&mut self, _success: bool, _iterations: usize, _cost: f64) {
                self.counter.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(AtomicUsize::new(0));
        let mut chain = FilterChain::new();
        chain.add(Box::new(CountingDone { counter: Arc::clone(&counter) }));
        chain.add(Box::new(CountingDone { counter: Arc::clone(&counter) }));

        chain.done(true, 10, 0.5);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
