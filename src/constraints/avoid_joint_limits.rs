//! Auxiliary constraint: keep joints away from their travel limits, and
//! pin update steps that would cross them.

use nalgebra::{DMatrix, DVector};
use crate::constraint::{Constraint, ConstraintResidual};
use crate::errors::IkError;
use crate::kinematic_traits::{JointLimit, Joints};
use crate::parameters::ConstraintParams;
use crate::solver_state::SolverState;

/// Pushes joints that entered a threshold zone near either limit back
/// toward the zone boundary. Joints in the comfortable middle contribute
/// zero rows, so the block has a fixed DOF row count without influencing
/// the solution when nothing is close to a limit. Unbounded joints are
/// skipped entirely.
///
/// Also implements the clip hook: a step that would take a joint past its
/// hard limit is pinned so the joint lands exactly on the bound.
pub struct AvoidJointLimits {
    pub weight: f64,
    /// Width of the avoidance zone at each end, as a fraction of the
    /// joint's range. Must stay below 0.5 or the zones would overlap.
    pub threshold: f64,
}

pub const DEFAULT_LIMIT_THRESHOLD: f64 = 0.05;

impl Default for AvoidJointLimits {
    fn default() -> Self {
        AvoidJointLimits {
            weight: 1.0,
            threshold: DEFAULT_LIMIT_THRESHOLD,
        }
    }
}

impl AvoidJointLimits {
    pub fn new() -> Self {
        AvoidJointLimits::default()
    }

    /// Options: `weight`, `threshold` (fraction of the range, below 0.5).
    pub fn from_params(params: &ConstraintParams) -> Result<Self, IkError> {
        let defaults = AvoidJointLimits::default();
        let weight = params.f64_or("weight", defaults.weight)?;
        let threshold = params.f64_or("threshold", defaults.threshold)?;
        if !(threshold > 0.0 && threshold < 0.5) {
            return Err(IkError::InvalidParameter(format!(
                "avoid_joint_limits threshold must be in (0, 0.5), got {}",
                threshold
            )));
        }
        Ok(AvoidJointLimits { weight, threshold })
    }

    /// Boundary the joint should retreat to, when it is inside a zone.
    fn zone_target(&self, limit: &JointLimit, q: f64) -> Option<f64> {
        if !limit.is_bounded() {
            return None;
        }
        let zone = self.threshold * limit.span();
        let low = limit.min + zone;
        let high = limit.max - zone;
        if q < low {
            Some(low)
        } else if q > high {
            Some(high)
        } else {
            None
        }
    }
}

impl Constraint for AvoidJointLimits {
    fn name(&self) -> &str {
        "avoid_joint_limits"
    }

    fn evaluate(&self, state: &SolverState) -> Result<ConstraintResidual, IkError> {
        let dof = state.dof();
        let mut error = DVector::zeros(dof);
        let mut jacobian = DMatrix::zeros(dof, dof);
        for (i, limit) in state.limits.iter().enumerate().take(dof) {
            if let Some(target) = self.zone_target(limit, state.joints[i]) {
                error[i] = self.weight * (target - state.joints[i]);
                jacobian[(i, i)] = self.weight;
            }
        }
        Ok(ConstraintResidual { error, jacobian })
    }

    /// Satisfied while every bounded joint stays inside its hard range.
    /// Being inside a threshold zone is uncomfortable, not a failure.
    fn is_satisfied(&self, state: &SolverState) -> bool {
        state
            .limits
            .iter()
            .zip(state.joints.iter())
            .all(|(limit, q)| limit.contains(*q))
    }

    fn clip_update(&self, state: &SolverState, delta: &mut Joints) -> bool {
        let mut modified = false;
        for (i, limit) in state.limits.iter().enumerate() {
            if i >= delta.len() {
                break;
            }
            let next = state.joints[i] + delta[i];
            let pinned = limit.clamp(next);
            if pinned != next {
                delta[i] = pinned - state.joints[i];
                modified = true;
            }
        }
        modified
    }
}
