//! Error handling for the solver and its configuration

use std::io;
use crate::kinematic_traits::Joints;

/// Unified error covering solver setup, the iteration loop and parameter loading.
#[derive(Debug)]
pub enum IkError {
    /// Solve was called before a kinematics implementation was bound
    /// with `initialize`.
    NotInitialized,
    /// A joint vector or matrix did not have the size the chain requires.
    DimensionMismatch { expected: usize, found: usize },
    /// The constraint set contains no primary constraint, so there is
    /// nothing to converge on.
    EmptyConstraintSet,
    /// The iteration cap was reached. The best estimate produced so far
    /// travels inside this error and is still usable.
    DidNotConverge {
        iterations: usize,
        error: f64,
        joints: Joints,
    },
    /// The stacked system was exactly singular and damping was disabled.
    SingularJacobian,
    /// A logging sink could not be opened or written.
    SinkUnavailable(String),
    /// No factory under this name in the registry.
    UnknownConstraint(String),
    /// A configuration value was missing, mistyped or out of range.
    InvalidParameter(String),
    IoError(io::Error),
}

impl std::fmt::Display for IkError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            IkError::NotInitialized =>
                write!(f, "Solver not initialized: no kinematics bound"),
            IkError::DimensionMismatch { expected, found } =>
                write!(f, "Dimension mismatch: expected {}, found {}", expected, found),
            IkError::EmptyConstraintSet =>
                write!(f, "Constraint set has no primary constraints"),
            IkError::DidNotConverge { iterations, error, .. } =>
                write!(f, "Did not converge after {} iterations, residual {}", iterations, error),
            IkError::SingularJacobian =>
                write!(f, "Singular constraint system and damping is disabled"),
            IkError::SinkUnavailable(ref sink) =>
                write!(f, "Logging sink unavailable: {}", sink),
            IkError::UnknownConstraint(ref name) =>
                write!(f, "Unknown constraint: {}", name),
            IkError::InvalidParameter(ref msg) =>
                write!(f, "Invalid parameter: {}", msg),
            IkError::IoError(ref err) =>
                write!(f, "IO Error: {}", err),
        }
    }
}

impl std::error::Error for IkError {}

impl From<io::Error> for IkError {
    fn from(err: io::Error) -> Self {
        IkError::IoError(err)
    }
}
