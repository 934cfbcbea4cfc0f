//! Registry - the process-wide configuration context
//!
//! Built once at startup, then shared as `Arc<Registry>` by every `Stats`.
//! Nothing in it changes during simulation.

use crate::condition::ConditionRegistry;
use crate::config::{self, ConfigError};
use crate::effect::EffectDef;
use crate::modifier::CalculateOptions;
use crate::operator::OperatorTable;
use crate::stats::Stats;
use crate::types::{EffectType, StatType};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Per-effect callback (activate, deactivate, add-stack, custom effects)
pub type EffectHook = Arc<dyn Fn(&mut Stats, &EffectType) + Send + Sync>;

/// Per-stat side effect run after its base or current value is set
pub type StatHook = Arc<dyn Fn(&mut Stats, &StatType) + Send + Sync>;

/// Replacement for the default calculation of one stat
pub type CalculateHook = Arc<dyn Fn(&Stats, &StatType, CalculateOptions) -> f32 + Send + Sync>;

/// Decides whether an entity currently ignores an effect type
pub type ImmunityHook = Arc<dyn Fn(&Stats, &EffectType) -> bool + Send + Sync>;

/// Stat defaults, effect definitions, operators, condition types and host hooks
#[derive(Default)]
pub struct Registry {
    operators: OperatorTable,
    conditions: ConditionRegistry,
    stat_defaults: HashMap<StatType, f32>,
    effects: HashMap<EffectType, Arc<EffectDef>>,
    calculate_overrides: HashMap<StatType, CalculateHook>,
    modified_hooks: HashMap<StatType, StatHook>,
    immunity: Option<ImmunityHook>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("operators", &self.operators)
            .field("conditions", &self.conditions)
            .field("stat_defaults", &self.stat_defaults)
            .field("effects", &self.effects.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Create an empty registry with the built-in operators and condition types
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the registry for sharing between `Stats` instances
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn operators_mut(&mut self) -> &mut OperatorTable {
        &mut self.operators
    }

    pub fn conditions(&self) -> &ConditionRegistry {
        &self.conditions
    }

    pub fn conditions_mut(&mut self) -> &mut ConditionRegistry {
        &mut self.conditions
    }

    /// Register a stat type with its default base value
    pub fn register_stat(&mut self, stat: impl Into<StatType>, default: f32) -> Result<(), ConfigError> {
        let stat = stat.into();
        if self.stat_defaults.contains_key(&stat) {
            return Err(ConfigError::DuplicateStat(stat.0));
        }
        self.stat_defaults.insert(stat, default);
        Ok(())
    }

    /// Check whether a stat has a registered default
    pub fn is_stat_registered(&self, stat: &StatType) -> bool {
        self.stat_defaults.contains_key(stat)
    }

    /// Default base value of a stat; unknown stats default to 0
    pub fn stat_default(&self, stat: &StatType) -> f32 {
        self.stat_defaults.get(stat).copied().unwrap_or(0.0)
    }

    /// Register an effect definition
    pub fn register_effect(&mut self, def: EffectDef) -> Result<(), ConfigError> {
        if self.effects.contains_key(&def.id) {
            return Err(ConfigError::DuplicateEffect(def.id.0));
        }
        self.effects.insert(def.id.clone(), Arc::new(def));
        Ok(())
    }

    /// Get an effect definition
    pub fn effect(&self, effect: &EffectType) -> Option<&Arc<EffectDef>> {
        self.effects.get(effect)
    }

    pub fn set_calculate_override(&mut self, stat: impl Into<StatType>, hook: CalculateHook) {
        self.calculate_overrides.insert(stat.into(), hook);
    }

    pub fn calculate_override(&self, stat: &StatType) -> Option<&CalculateHook> {
        self.calculate_overrides.get(stat)
    }

    pub fn set_modified_hook(&mut self, stat: impl Into<StatType>, hook: StatHook) {
        self.modified_hooks.insert(stat.into(), hook);
    }

    pub fn modified_hook(&self, stat: &StatType) -> Option<&StatHook> {
        self.modified_hooks.get(stat)
    }

    /// Set the predicate deciding whether an entity ignores an effect
    pub fn set_immunity(&mut self, hook: ImmunityHook) {
        self.immunity = Some(hook);
    }

    pub fn immunity(&self) -> Option<&ImmunityHook> {
        self.immunity.as_ref()
    }

    /// Register the `[stats]` table and `[[effects]]` entries of a TOML document
    pub fn register_toml(&mut self, content: &str) -> Result<(), ConfigError> {
        for (stat, default) in config::parse_stat_defaults(content)? {
            self.register_stat(stat, default)?;
        }
        for def in config::parse_effect_defs(content, &self.conditions)? {
            self.register_effect(def)?;
        }
        Ok(())
    }

    /// Register a TOML configuration file
    pub fn register_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        self.register_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_stat_rejected() {
        let mut registry = Registry::new();
        registry.register_stat("health", 100.0).unwrap();
        let err = registry.register_stat("health", 50.0);
        assert!(matches!(err, Err(ConfigError::DuplicateStat(name)) if name == "health"));
        assert_eq!(registry.stat_default(&StatType::from("health")), 100.0);
    }

    #[test]
    fn test_duplicate_effect_rejected() {
        let mut registry = Registry::new();
        registry.register_effect(EffectDef::new("poison")).unwrap();
        let err = registry.register_effect(EffectDef::new("poison"));
        assert!(matches!(err, Err(ConfigError::DuplicateEffect(_))));
    }

    #[test]
    fn test_unknown_stat_defaults_to_zero() {
        let registry = Registry::new();
        assert_eq!(registry.stat_default(&StatType::from("luck")), 0.0);
        assert!(registry.effect(&EffectType::from("poison")).is_none());
    }

    #[test]
    fn test_register_toml() {
        let toml = r#"
[stats]
health = 100.0
mana = 40.0

[[effects]]
id = "poison"
max_stack = 5

[effects.stack_mode]
type = "multi"
"#;
        let mut registry = Registry::new();
        registry.register_toml(toml).unwrap();
        assert_eq!(registry.stat_default(&StatType::from("mana")), 40.0);
        let poison = registry.effect(&EffectType::from("poison")).unwrap();
        assert_eq!(poison.max_stack, 5);

        // Registering the same document twice is a configuration error
        assert!(registry.register_toml(toml).is_err());
    }
}
