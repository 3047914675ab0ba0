//! Supports building a configured solver from a YAML description (optional)

use std::path::Path;
use yaml_rust2::{Yaml, YamlLoader};

use crate::constraint::ConstraintTier;
use crate::errors::IkError;
use crate::parameters::{ConstraintParams, ParamValue, SolverConfig};
use crate::registry::ConstraintRegistry;
use crate::solver::IKSolver;

/// Build a solver from a YAML string. YAML like this is supported:
/// ```yaml
/// solver:
///   damping: 0.01
///   joint_update_gain: 0.5
///   max_iterations: 500
///   convergence_tolerance: 1.0e-4
///   debug: false
/// constraints:
///   - class: goal_position
///     primary: true
///     weight: [1.0, 1.0, 1.0]
///     tolerance: 0.001
///   - class: minimize_change
///     primary: false
///     weight: 0.5
/// ```
/// The `solver` section is optional and falls back to defaults key by key.
/// Every constraint entry needs `class` (a name known to the registry) and
/// `primary`; the remaining keys are handed to the constraint factory as
/// they are. The returned solver still has to be initialized with a robot.
pub fn solver_from_yaml_str(
    text: &str,
    registry: &ConstraintRegistry,
) -> Result<IKSolver, IkError> {
    let docs = YamlLoader::load_from_str(text)
        .map_err(|error| IkError::InvalidParameter(format!("YAML parse error: {}", error)))?;
    let doc = docs
        .first()
        .ok_or_else(|| IkError::InvalidParameter("the YAML document is empty".to_string()))?;

    let mut solver = IKSolver::new(config_from_yaml(doc)?)?;

    let constraints = &doc["constraints"];
    let entries = constraints.as_vec().ok_or_else(|| {
        IkError::InvalidParameter("a 'constraints' list is required".to_string())
    })?;
    for entry in entries {
        let hash = entry.as_hash().ok_or_else(|| {
            IkError::InvalidParameter("every constraint entry must be a mapping".to_string())
        })?;
        let class = entry["class"].as_str().ok_or_else(|| {
            IkError::InvalidParameter("every constraint entry needs a 'class' name".to_string())
        })?;
        let primary = match &entry["primary"] {
            Yaml::Boolean(flag) => *flag,
            Yaml::BadValue => {
                return Err(IkError::InvalidParameter(format!(
                    "constraint '{}' needs a 'primary' flag",
                    class
                )));
            }
            _ => {
                return Err(IkError::InvalidParameter(format!(
                    "'primary' of constraint '{}' must be a boolean",
                    class
                )));
            }
        };

        let mut params = ConstraintParams::new();
        for (key, value) in hash {
            let key = key.as_str().ok_or_else(|| {
                IkError::InvalidParameter(format!(
                    "constraint '{}' has a non-string option key",
                    class
                ))
            })?;
            if key == "class" || key == "primary" {
                continue;
            }
            params.insert(key, param_value(value, key)?);
        }

        let constraint = registry.create(class, &params)?;
        solver.add_constraint(constraint, ConstraintTier::from_primary_flag(primary));
    }

    Ok(solver)
}

/// Reads the YAML file and builds the solver from its contents.
pub fn solver_from_yaml_file<P: AsRef<Path>>(
    path: P,
    registry: &ConstraintRegistry,
) -> Result<IKSolver, IkError> {
    let contents = std::fs::read_to_string(path)?;
    solver_from_yaml_str(&contents, registry)
}

/// Reads the `solver` section. Missing keys keep their defaults; the
/// assembled configuration is validated before it is returned.
pub fn config_from_yaml(doc: &Yaml) -> Result<SolverConfig, IkError> {
    let section = &doc["solver"];
    let mut config = SolverConfig::default();
    config.damping = float_field(section, "damping", config.damping)?;
    config.joint_update_gain =
        float_field(section, "joint_update_gain", config.joint_update_gain)?;
    config.max_iterations = count_field(section, "max_iterations", config.max_iterations)?;
    config.convergence_tolerance = float_field(
        section,
        "convergence_tolerance",
        config.convergence_tolerance,
    )?;
    config.debug = bool_field(section, "debug", config.debug)?;
    config.validate()?;
    Ok(config)
}

fn float_field(section: &Yaml, key: &str, default: f64) -> Result<f64, IkError> {
    match &section[key] {
        Yaml::BadValue => Ok(default),
        Yaml::Integer(i) => Ok(*i as f64),
        value => value.as_f64().ok_or_else(|| {
            IkError::InvalidParameter(format!("solver option '{}' must be a number", key))
        }),
    }
}

fn count_field(section: &Yaml, key: &str, default: usize) -> Result<usize, IkError> {
    match &section[key] {
        Yaml::BadValue => Ok(default),
        Yaml::Integer(i) if *i >= 0 => Ok(*i as usize),
        _ => Err(IkError::InvalidParameter(format!(
            "solver option '{}' must be a non-negative integer",
            key
        ))),
    }
}

fn bool_field(section: &Yaml, key: &str, default: bool) -> Result<bool, IkError> {
    match &section[key] {
        Yaml::BadValue => Ok(default),
        Yaml::Boolean(flag) => Ok(*flag),
        _ => Err(IkError::InvalidParameter(format!(
            "solver option '{}' must be a boolean",
            key
        ))),
    }
}

/// Converts one YAML scalar or list into the format-independent value the
/// constraint factories consume. Nested mappings are not supported.
fn param_value(yaml: &Yaml, key: &str) -> Result<ParamValue, IkError> {
    match yaml {
        Yaml::Boolean(flag) => Ok(ParamValue::Bool(*flag)),
        Yaml::Integer(i) => Ok(ParamValue::Int(*i)),
        Yaml::Real(_) => yaml.as_f64().map(ParamValue::Float).ok_or_else(|| {
            IkError::InvalidParameter(format!("option '{}' holds an unreadable number", key))
        }),
        Yaml::String(text) => Ok(ParamValue::Str(text.clone())),
        Yaml::Array(items) => {
            let converted: Result<Vec<ParamValue>, IkError> =
                items.iter().map(|item| param_value(item, key)).collect();
            Ok(ParamValue::List(converted?))
        }
        _ => Err(IkError::InvalidParameter(format!(
            "option '{}' has an unsupported value",
            key
        ))),
    }
}
