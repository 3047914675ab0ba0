//! Retry policy for hard seeds. The solver itself never retries; when a
//! solve runs into the iteration cap, this wrapper re-seeds it at random
//! positions within the joint limits and tries again.

use rand::Rng;
use std::f64::consts::PI;
use crate::errors::IkError;
use crate::kinematic_traits::{JointLimit, Joints, Pose};
use crate::solver::IKSolver;

/// Runs the wrapped solve up to `max_attempts` times: first from the
/// caller's seed, then from uniformly random seeds. Only `DidNotConverge`
/// triggers a retry; structural errors would fail identically every time
/// and are returned at once.
pub struct RandomRestart {
    pub max_attempts: usize,
}

impl RandomRestart {
    pub fn new(max_attempts: usize) -> Self {
        assert!(max_attempts >= 1, "At least one attempt is required");
        RandomRestart { max_attempts }
    }

    pub fn solve(
        &self,
        solver: &mut IKSolver,
        goal: &Pose,
        seed: &Joints,
    ) -> Result<Joints, IkError> {
        let mut last_failure = match solver.solve(goal, seed) {
            Ok(joints) => return Ok(joints),
            Err(failure @ IkError::DidNotConverge { .. }) => failure,
            Err(other) => return Err(other),
        };

        let mut rng = rand::thread_rng();
        for _ in 1..self.max_attempts {
            let restart_seed = random_seed(&mut rng, solver.joint_limits(), seed);
            match solver.solve(goal, &restart_seed) {
                Ok(joints) => return Ok(joints),
                Err(failure @ IkError::DidNotConverge { .. }) => last_failure = failure,
                Err(other) => return Err(other),
            }
        }
        Err(last_failure)
    }
}

/// Uniform sample inside the limits; unbounded joints get a full turn
/// around their reference value instead.
fn random_seed<R: Rng>(rng: &mut R, limits: &[JointLimit], reference: &Joints) -> Joints {
    Joints::from_iterator(
        reference.len(),
        limits.iter().zip(reference.iter()).map(|(limit, q)| {
            if limit.is_bounded() {
                rng.gen_range(limit.min..=limit.max)
            } else {
                rng.gen_range((q - PI)..=(q + PI))
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SerialChain;
    use crate::constraint::ConstraintTier;
    use crate::goal_position::GoalPosition;
    use crate::kinematic_traits::Kinematics;
    use crate::parameters::SolverConfig;
    use crate::utils::joints;
    use std::sync::Arc;

    fn position_solver(chain: SerialChain, max_iterations: usize) -> IKSolver {
        let config = SolverConfig {
            damping: 0.01,
            joint_update_gain: 1.0,
            max_iterations,
            convergence_tolerance: 1e-6,
            debug: false,
        };
        let mut solver = IKSolver::new(config).unwrap();
        solver.initialize(Arc::new(chain));
        solver.add_constraint(Box::new(GoalPosition::new()), ConstraintTier::Primary);
        solver
    }

    #[test]
    fn test_first_attempt_success_passes_through() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let at = joints(&[0.3, -0.5]);
        let goal = chain.forward(&at).unwrap();
        let mut solver = position_solver(chain, 100);

        let restart = RandomRestart::new(5);
        let solution = restart.solve(&mut solver, &goal, &at).unwrap();
        assert_eq!(solution, at);
        assert_eq!(solver.iterations(), 0);
    }

    #[test]
    fn test_structural_errors_are_not_retried() {
        // No constraints: every attempt would fail the same way
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let config = SolverConfig::default();
        let mut solver = IKSolver::new(config).unwrap();
        solver.initialize(Arc::new(chain));

        let restart = RandomRestart::new(50);
        let result = restart.solve(&mut solver, &Pose::identity(), &joints(&[0.0, 0.0]));
        assert!(matches!(result, Err(IkError::EmptyConstraintSet)));
    }

    #[test]
    fn test_unreachable_goal_reports_the_failure() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        // Two meters of arm cannot reach three meters out
        let goal = Pose::translation(3.0, 0.0, 0.0);
        let mut solver = position_solver(chain, 20);

        let restart = RandomRestart::new(3);
        let result = restart.solve(&mut solver, &goal, &joints(&[0.1, 0.1]));
        assert!(matches!(result, Err(IkError::DidNotConverge { .. })));
    }

    #[test]
    fn test_reachable_goal_solves_within_attempts() {
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let goal = chain.forward(&joints(&[0.7, 0.9])).unwrap();
        let goal = Pose::translation(goal.translation.vector.x, goal.translation.vector.y, 0.0);
        let mut solver = position_solver(chain, 200);

        let restart = RandomRestart::new(20);
        let solution = restart
            .solve(&mut solver, &goal, &joints(&[0.0, 0.0]))
            .unwrap();
        // Verify in Cartesian space, any elbow branch is acceptable
        let chain = SerialChain::planar(&[1.0, 1.0]);
        let tip = chain.forward(&solution).unwrap();
        assert!((tip.translation.vector - goal.translation.vector).norm() < 1e-5);
    }
}
