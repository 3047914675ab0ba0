//! Rust implementation of constrained inverse kinematics for serial
//! manipulators, solving for a whole set of prioritized constraints rather
//! than the tip pose alone
//!
//! The solver iterates damped least squares over the stacked residuals and
//! Jacobians of pluggable constraints. Constraints come in two tiers:
//! primary constraints define what it means to have solved the problem
//! (reach a position, match an orientation), auxiliary constraints shape the
//! solution among the candidates (stay away from joint limits, stay close to
//! the seed). This follows the approach of the ROS-Industrial
//! [constrained_ik](https://github.com/ros-industrial/constrained_ik)
//! package. The trajectory update filters draw on _STOMP: Stochastic
//! Trajectory Optimization for Motion Planning_ by Mrinal Kalakrishnan,
//! Sachin Chitta, Evangelos Theodorou, Peter Pastor and Stefan Schaal (2011),
//! where per-iteration updates of a whole trajectory are post-processed
//! before they are applied.
//!
//! # Features
//!
//! - Damped least squares core. With damping enabled the update stays
//!   bounded through singular configurations; disabling damping makes exact
//!   singularities a reported error instead.
//! - Constraints are pluggable: implement the `Constraint` trait and add the
//!   instance to either tier. Convergence is judged on the primary tier
//!   only, in the order the constraints were added.
//! - Bundled constraints: goal position, goal orientation, joint limit
//!   avoidance, and minimal departure from the seed.
//! - Joint limits are enforced by hard clamping after every step, and
//!   constraints may clip the raw update before it is applied.
//! - Random restarts from perturbed seeds for goals the first seed cannot
//!   reach.
//! - The robot can be equipped with a tool and placed on a base, solving for
//!   the tool center point rather than the flange. Jacobians follow.
//! - Serial chains are described joint by joint (revolute or prismatic, any
//!   axis), with analytic Jacobians cross-checked by numerical ones.
//! - Solvers can be assembled from YAML files, with constraint classes
//!   resolved through an extensible registry.
//! - Long solves can be cancelled from another thread; every intermediate
//!   step can be recorded for inspection.
//!
//! The `main.rs` binary walks through a complete session: building a chain,
//! stacking constraints of both tiers, solving, and filtering trajectory
//! updates with logging.

pub mod parameters;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod errors;
pub mod kinematic_traits;
pub mod chain;

pub mod constraint;
pub mod constraint_set;

#[path = "constraints/goal_position.rs"]
pub mod goal_position;
#[path = "constraints/goal_orientation.rs"]
pub mod goal_orientation;
#[path = "constraints/avoid_joint_limits.rs"]
pub mod avoid_joint_limits;
#[path = "constraints/minimize_change.rs"]
pub mod minimize_change;

pub mod registry;

pub mod jacobian;
pub mod solver_state;
pub mod solver;
pub mod restart;

pub mod tool;

#[path = "filters/update_filter.rs"]
pub mod update_filter;
#[path = "filters/step_clamp.rs"]
pub mod step_clamp;
#[path = "filters/update_logger.rs"]
pub mod update_logger;

#[cfg(test)]
mod tests;
