//! Name-keyed constraint factories. External code registers its own
//! constraint types here; configuration files then refer to them by name.
//! Registration is explicit, nothing is discovered at runtime.

use std::collections::HashMap;
use crate::avoid_joint_limits::AvoidJointLimits;
use crate::constraint::Constraint;
use crate::errors::IkError;
use crate::goal_orientation::GoalOrientation;
use crate::goal_position::GoalPosition;
use crate::minimize_change::MinimizeChange;
use crate::parameters::ConstraintParams;

/// Builds one configured constraint from its parameter map.
pub type ConstraintFactory = fn(&ConstraintParams) -> Result<Box<dyn Constraint>, IkError>;

pub struct ConstraintRegistry {
    factories: HashMap<String, ConstraintFactory>,
}

impl ConstraintRegistry {
    /// An empty registry. Most callers want `with_builtins`.
    pub fn new() -> Self {
        ConstraintRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry with the stock constraints already in:
    /// `goal_position`, `goal_orientation`, `avoid_joint_limits` and
    /// `minimize_change`.
    pub fn with_builtins() -> Self {
        let mut registry = ConstraintRegistry::new();
        registry.register("goal_position", |p| {
            Ok(Box::new(GoalPosition::from_params(p)?))
        });
        registry.register("goal_orientation", |p| {
            Ok(Box::new(GoalOrientation::from_params(p)?))
        });
        registry.register("avoid_joint_limits", |p| {
            Ok(Box::new(AvoidJointLimits::from_params(p)?))
        });
        registry.register("minimize_change", |p| {
            Ok(Box::new(MinimizeChange::from_params(p)?))
        });
        registry
    }

    /// Registers a factory, replacing any previous one under the same name.
    pub fn register(&mut self, name: impl Into<String>, factory: ConstraintFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted for stable diagnostics.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }

    pub fn create(
        &self,
        name: &str,
        params: &ConstraintParams,
    ) -> Result<Box<dyn Constraint>, IkError> {
        match self.factories.get(name) {
            Some(factory) => factory(params),
            None => Err(IkError::UnknownConstraint(name.to_string())),
        }
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        ConstraintRegistry::with_builtins()
    }
}
