//! Damped least squares inverse kinematics over a stack of prioritized
//! constraints. The solver owns the constraint set and a numeric
//! configuration, binds a kinematics implementation once, and then serves
//! any number of sequential solves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use bitflags::bitflags;
use tracing::debug;
use crate::constraint::{Constraint, ConstraintTier};
use crate::constraint_set::ConstraintSet;
use crate::errors::IkError;
use crate::jacobian::damped_least_squares;
use crate::kinematic_traits::{check_dof, JointLimit, Joints, Kinematics, Pose};
use crate::parameters::SolverConfig;
use crate::solver_state::SolverState;
use crate::utils::clip_to_limits;

bitflags! {
    /// Annotations on one entry of the recorded iteration path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IterationFlags: u32 {
        /// A constraint clip hook altered the step.
        const CONSTRAINT_CLIPPED = 1 << 0;
        /// Joints had to be pinned to their limits after the step.
        const LIMIT_CLIPPED = 1 << 1;
        /// The step norm fell below the tolerance while the residual did
        /// not. The solve keeps running; this only marks the entry.
        const STALLED = 1 << 2;
        /// Primary residual and tolerance checks passed here.
        const CONVERGED = 1 << 3;
    }
}

/// One point of the iteration path, recorded when `debug` is set in the
/// configuration.
#[derive(Debug, Clone)]
pub struct IterationRecord {
    /// Joint positions after the step of this iteration was applied.
    pub joints: Joints,
    /// Maximum absolute primary residual the step was computed from.
    pub error: f64,
    pub flags: IterationFlags,
}

/// The solver. Create with a validated configuration, bind a chain with
/// `initialize`, add constraints, then call `solve` per goal.
pub struct IKSolver {
    kinematics: Option<Arc<dyn Kinematics>>,
    limits: Vec<JointLimit>,
    /// The constraints driving this solver. Open for direct access; the
    /// set and its constraints live exactly as long as the solver.
    pub constraints: ConstraintSet,
    config: SolverConfig,
    iterations: usize,
    converged: bool,
    path: Vec<IterationRecord>,
    cancel: Option<Arc<AtomicBool>>,
}

impl IKSolver {
    pub fn new(config: SolverConfig) -> Result<Self, IkError> {
        config.validate()?;
        Ok(IKSolver {
            kinematics: None,
            limits: Vec::new(),
            constraints: ConstraintSet::new(),
            config,
            iterations: 0,
            converged: false,
            path: Vec::new(),
            cancel: None,
        })
    }

    /// Binds the chain the solver works on. Joint limits are taken from
    /// the kinematics and enforced by a hard clamp on every iteration.
    pub fn initialize(&mut self, kinematics: Arc<dyn Kinematics>) {
        self.limits = kinematics.joint_limits().to_vec();
        self.kinematics = Some(kinematics);
    }

    pub fn is_initialized(&self) -> bool {
        self.kinematics.is_some()
    }

    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>, tier: ConstraintTier) {
        self.constraints.add(constraint, tier);
    }

    /// Shared flag polled once per iteration; setting it makes the running
    /// solve return early with its current estimate inside
    /// `DidNotConverge`. Bounds worst case latency when a caller has to
    /// give up on a solve from another thread.
    pub fn set_cancel_flag(&mut self, flag: Option<Arc<AtomicBool>>) {
        self.cancel = flag;
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Limits of the bound chain; empty before `initialize`.
    pub fn joint_limits(&self) -> &[JointLimit] {
        &self.limits
    }

    /// Update steps taken by the most recent solve. Zero when the seed
    /// already satisfied the primary constraints.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Recorded path of the most recent solve; empty unless the `debug`
    /// flag of the configuration is set.
    pub fn iteration_path(&self) -> &[IterationRecord] {
        &self.path
    }

    /// Runs the iteration until the primary constraints converge or the
    /// cap is reached. On success the solved joints come back in the Ok
    /// branch; when the cap fires they travel inside `DidNotConverge`
    /// together with the residual, so the best estimate is never lost.
    pub fn solve(&mut self, goal: &Pose, seed: &Joints) -> Result<Joints, IkError> {
        let kinematics = match &self.kinematics {
            Some(k) => Arc::clone(k),
            None => return Err(IkError::NotInitialized),
        };
        check_dof(kinematics.dof(), seed)?;

        self.iterations = 0;
        self.converged = false;
        self.path.clear();

        let mut state = SolverState::new(goal, seed, &self.limits);

        loop {
            state.tip_pose = kinematics.forward(&state.joints)?;
            state.jacobian = kinematics.jacobian(&state.joints)?;

            let system = self.constraints.build_system(&state)?;
            let residual = system.max_primary_error();

            if residual <= self.config.convergence_tolerance
                && self.constraints.primary_satisfied(&state)
            {
                state.converged = true;
                self.converged = true;
                self.iterations = state.iter;
                if self.config.debug {
                    self.path.push(IterationRecord {
                        joints: state.joints.clone(),
                        error: residual,
                        flags: IterationFlags::CONVERGED,
                    });
                }
                debug!(iterations = state.iter, residual, "converged");
                return Ok(state.joints);
            }

            if let Some(cancel) = &self.cancel {
                if cancel.load(Ordering::Relaxed) {
                    self.iterations = state.iter;
                    debug!(iterations = state.iter, "solve cancelled");
                    return Err(IkError::DidNotConverge {
                        iterations: state.iter,
                        error: residual,
                        joints: state.joints,
                    });
                }
            }

            if state.iter >= self.config.max_iterations {
                self.iterations = state.iter;
                debug!(iterations = state.iter, residual, "iteration cap reached");
                return Err(IkError::DidNotConverge {
                    iterations: state.iter,
                    error: residual,
                    joints: state.joints,
                });
            }

            let mut delta =
                damped_least_squares(&system.jacobian, &system.error, self.config.damping)?;
            delta *= self.config.joint_update_gain;

            let mut flags = IterationFlags::empty();
            if self.constraints.clip_update(&state, &mut delta) {
                flags |= IterationFlags::CONSTRAINT_CLIPPED;
            }

            state.joints += &delta;
            state.joints_delta = delta;
            if clip_to_limits(&mut state.joints, &self.limits) {
                flags |= IterationFlags::LIMIT_CLIPPED;
            }
            state.iter += 1;

            // No progress in joint space is a stall, not a success: the
            // residual is still above tolerance, so keep going until the
            // cap decides.
            if state.joints_delta.norm() < self.config.convergence_tolerance {
                flags |= IterationFlags::STALLED;
                debug!(iter = state.iter, "update stalled below tolerance");
            }

            if self.config.debug {
                self.path.push(IterationRecord {
                    joints: state.joints.clone(),
                    error: residual,
                    flags,
                });
            }
        }
    }
}
