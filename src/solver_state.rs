//! Mutable state of one solve in progress. The solver owns exactly one of
//! these per `solve` call and hands it to every constraint as the
//! evaluation context, so constraints see the same joints, goal and chain
//! snapshot the solver is working with.

use nalgebra::Matrix6xX;
use crate::kinematic_traits::{JointLimit, Joints, Pose};

pub struct SolverState {
    /// Current estimate of the joint positions.
    pub joints: Joints,
    /// Step applied in the most recent iteration (zero before the first).
    pub joints_delta: Joints,
    /// Update steps taken so far.
    pub iter: usize,
    /// The pose the primary constraints drive the tip towards.
    pub goal: Pose,
    /// Joint positions the solve started from.
    pub joint_seed: Joints,
    pub converged: bool,
    /// Tip pose at `joints`, refreshed at the top of every iteration.
    pub tip_pose: Pose,
    /// Tip Jacobian at `joints`, refreshed together with `tip_pose`.
    pub jacobian: Matrix6xX<f64>,
    /// Travel ranges of the chain, one per joint.
    pub limits: Vec<JointLimit>,
}

impl SolverState {
    pub fn new(goal: &Pose, seed: &Joints, limits: &[JointLimit]) -> Self {
        SolverState {
            joints: seed.clone(),
            joints_delta: Joints::zeros(seed.len()),
            iter: 0,
            goal: *goal,
            joint_seed: seed.clone(),
            converged: false,
            tip_pose: Pose::identity(),
            jacobian: Matrix6xX::zeros(seed.len()),
            limits: limits.to_vec(),
        }
    }

    pub fn dof(&self) -> usize {
        self.joints.len()
    }
}
