//! Effect definition loading

use super::ConfigError;
use crate::condition::{ConditionRegistry, ConditionSpec};
use crate::effect::{EffectDef, StackMode};
use crate::modifier::ModifierDef;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable part of an effect definition
///
/// Hooks and custom effects are code, so they are attached to the built
/// `EffectDef` before it is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectConfig {
    pub id: String,
    #[serde(default)]
    pub max_stack: u32,
    #[serde(default)]
    pub stack_mode: StackMode,
    #[serde(default)]
    pub duration: Option<ConditionSpec>,
    #[serde(default)]
    pub modifiers: Vec<ModifierDef>,
}

impl EffectConfig {
    pub fn build(&self, conditions: &ConditionRegistry) -> Result<EffectDef, ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::ValidationError(
                "effect id must not be empty".to_string(),
            ));
        }
        let mut def = EffectDef::new(self.id.as_str())
            .with_max_stack(self.max_stack)
            .with_stack_mode(self.stack_mode);
        if let Some(spec) = self.duration.as_ref() {
            def.duration = Some(conditions.build(spec)?);
        }
        for modifier in &self.modifiers {
            if modifier.duration.is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "modifier on '{}' of effect '{}' must not have its own duration",
                    modifier.stat, self.id
                )));
            }
            def.modifiers.push(modifier.build(conditions)?);
        }
        Ok(def)
    }
}

/// Container for effect configurations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectsConfig {
    #[serde(default)]
    pub effects: Vec<EffectConfig>,
}

/// Load effect definitions from a TOML file
pub fn load_effect_defs(path: &Path, conditions: &ConditionRegistry) -> Result<Vec<EffectDef>, ConfigError> {
    let config: EffectsConfig = super::load_toml(path)?;
    config.effects.iter().map(|e| e.build(conditions)).collect()
}

/// Load effect definitions from a TOML string
pub fn parse_effect_defs(content: &str, conditions: &ConditionRegistry) -> Result<Vec<EffectDef>, ConfigError> {
    let config: EffectsConfig = super::parse_toml(content)?;
    config.effects.iter().map(|e| e.build(conditions)).collect()
}
