//! Clamps trajectory updates element-wise. Optimizers occasionally propose
//! a huge jump for a single waypoint (noisy rollouts, a near-singular
//! projection). This filter keeps every per-joint step within a fixed
//! magnitude so one bad iteration cannot throw the trajectory far away.

extern crate nalgebra as na;

use na::DMatrix;
use crate::errors::IkError;
use crate::update_filter::{check_window, UpdateFilter};

pub struct StepClamp {
    /// Largest allowed magnitude of a single update element.
    max_step: f64,
}

impl StepClamp {
    pub fn new(max_step: f64) -> Result<Self, IkError> {
        if !max_step.is_finite() || max_step <= 0.0 {
            return Err(IkError::InvalidParameter(format!(
                "the step limit must be positive, got {}",
                max_step
            )));
        }
        Ok(StepClamp { max_step })
    }

    pub fn max_step(&self) -> f64 {
        self.max_step
    }
}

impl UpdateFilter for StepClamp {
    fn name(&self) -> &str {
        "step_clamp"
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
        let mut modified = false;
        for c in start..start + len {
            for r in 0..update.nrows() {
                let value = update[(r, c)];
                let clamped = value.clamp(-self.max_step, self.max_step);
                if clamped != value {
                    update[(r, c)] = clamped;
                    modified = true;
                }
            }
        }
        Ok(modified)
    }
}
