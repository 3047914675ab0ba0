//! Numeric configuration of the solver and the opaque parameter maps
//! constraints are built from.

use std::collections::HashMap;
use nalgebra::Vector3;
use crate::errors::IkError;

/// Tuning knobs of the iteration loop.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Damping added to the diagonal of the normal equations. Keeps the
    /// step bounded near singular configurations. Zero disables damping,
    /// making `SingularJacobian` reachable.
    pub damping: f64,

    /// Fraction of the computed step actually applied, in (0, 1].
    pub joint_update_gain: f64,

    /// Upper bound on update steps per solve.
    pub max_iterations: usize,

    /// Primary residuals below this count as converged. Also the threshold
    /// for flagging an iteration as stalled.
    pub convergence_tolerance: f64,

    /// Record every intermediate joint vector into the iteration path.
    pub debug: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            damping: 0.01,
            joint_update_gain: 0.5,
            max_iterations: 500,
            convergence_tolerance: 1e-4,
            debug: false,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), IkError> {
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(IkError::InvalidParameter(format!(
                "damping must be finite and non-negative, got {}",
                self.damping
            )));
        }
        if !(self.joint_update_gain > 0.0 && self.joint_update_gain <= 1.0) {
            return Err(IkError::InvalidParameter(format!(
                "joint_update_gain must be in (0, 1], got {}",
                self.joint_update_gain
            )));
        }
        if self.max_iterations == 0 {
            return Err(IkError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !self.convergence_tolerance.is_finite() || self.convergence_tolerance <= 0.0 {
            return Err(IkError::InvalidParameter(format!(
                "convergence_tolerance must be finite and positive, got {}",
                self.convergence_tolerance
            )));
        }
        Ok(())
    }
}

/// One configuration value. Whatever shape the source format had is
/// preserved here; only the constraint being built interprets the keys.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Int(i) => Some(i as f64),
            ParamValue::Float(f) => Some(f),
            _ => None,
        }
    }
}

/// String-keyed bag of options passed to a constraint factory. The solver
/// core never looks inside.
#[derive(Debug, Clone, Default)]
pub struct ConstraintParams {
    values: HashMap<String, ParamValue>,
}

impl ConstraintParams {
    pub fn new() -> Self {
        ConstraintParams::default()
    }

    /// Builder-style insert, convenient when wiring constraints in code.
    pub fn with(mut self, key: &str, value: ParamValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number with a default for the missing key. A present key of the
    /// wrong type is an error, not a silent default.
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, IkError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| {
                IkError::InvalidParameter(format!("'{}' must be a number", key))
            }),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, IkError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(_) => Err(IkError::InvalidParameter(format!(
                "'{}' must be a boolean",
                key
            ))),
        }
    }

    /// Three component vector. Accepts a single number (applied to all
    /// three axes) or a list of exactly three numbers.
    pub fn vector3_or(&self, key: &str, default: Vector3<f64>) -> Result<Vector3<f64>, IkError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => {
                if let Some(scalar) = value.as_f64() {
                    return Ok(Vector3::new(scalar, scalar, scalar));
                }
                if let ParamValue::List(items) = value {
                    if items.len() == 3 {
                        let mut out = Vector3::zeros();
                        for (i, item) in items.iter().enumerate() {
                            out[i] = item.as_f64().ok_or_else(|| {
                                IkError::InvalidParameter(format!(
                                    "'{}' must contain numbers",
                                    key
                                ))
                            })?;
                        }
                        return Ok(out);
                    }
                }
                Err(IkError::InvalidParameter(format!(
                    "'{}' must be a number or a list of three numbers",
                    key
                )))
            }
        }
    }
}
