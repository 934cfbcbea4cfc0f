//! Stat default loading

use super::ConfigError;
use crate::types::StatType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Container for stat defaults
///
/// ```toml
/// [stats]
/// health = 100.0
/// mana = 50.0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub stats: BTreeMap<String, f32>,
}

impl StatsConfig {
    fn into_defaults(self) -> Result<Vec<(StatType, f32)>, ConfigError> {
        self.stats
            .into_iter()
            .map(|(name, value)| {
                if name.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "stat type name must not be empty".to_string(),
                    ));
                }
                if !value.is_finite() {
                    return Err(ConfigError::ValidationError(format!(
                        "default for stat '{}' is not finite",
                        name
                    )));
                }
                Ok((StatType(name), value))
            })
            .collect()
    }
}

/// Load stat defaults from a TOML file
pub fn load_stat_defaults(path: &Path) -> Result<Vec<(StatType, f32)>, ConfigError> {
    let config: StatsConfig = super::load_toml(path)?;
    config.into_defaults()
}

/// Load stat defaults from a TOML string
pub fn parse_stat_defaults(content: &str) -> Result<Vec<(StatType, f32)>, ConfigError> {
    let config: StatsConfig = super::parse_toml(content)?;
    config.into_defaults()
}
