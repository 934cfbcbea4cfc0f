//! Configuration loading from TOML files

mod effects;
mod stats;

pub use effects::{load_effect_defs, parse_effect_defs, EffectConfig, EffectsConfig};
pub use stats::{load_stat_defaults, parse_stat_defaults, StatsConfig};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration error
///
/// Raised while building the registry; none of these are recoverable at runtime.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    #[error("Stat type '{0}' is already registered")]
    DuplicateStat(String),
    #[error("Effect type '{0}' is already registered")]
    DuplicateEffect(String),
    #[error("Operator '{0}' is already registered")]
    DuplicateOperator(String),
    #[error("Condition type '{0}' is already registered")]
    DuplicateConditionType(String),
    #[error("Unknown condition type '{0}'")]
    UnknownConditionType(String),
    #[error("Invalid parameters for condition type '{tag}': {details}")]
    InvalidConditionParams { tag: String, details: String },
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}
