//! Condition type registry and serializable condition specs

use super::{Condition, ConditionKind, ConditionParams, ResourceCondition, StatReader, TimedCondition};
use crate::config::ConfigError;
use crate::types::StatType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A code-registered condition payload
///
/// Implementors declare which events they depend on through `uses_timer`
/// and `watched_stat`; the owning `Stats` subscribes them accordingly.
pub trait CustomCondition: fmt::Debug + Send + Sync {
    /// Tag the payload was registered under
    fn type_tag(&self) -> &str;

    fn evaluate(&self, stats: &dyn StatReader) -> bool;

    /// Whether `tick` should be called on every `Stats::process`
    fn uses_timer(&self) -> bool {
        false
    }

    /// Stat whose changes should re-evaluate this payload
    fn watched_stat(&self) -> Option<&StatType> {
        None
    }

    fn tick(&mut self, _delta: f32) {}

    /// Restore the payload to its configured start
    fn reset(&mut self) {}

    /// Configuration fields, written into the condition spec
    fn params(&self) -> ConditionParams {
        ConditionParams::new()
    }

    fn box_clone(&self) -> Box<dyn CustomCondition>;
}

/// Serializable form of a condition tree, tagged by condition type
///
/// ```toml
/// type = "resource"
/// stat = "mana"
/// compare = "less_equals"
/// target = 20.0
/// is_percent = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub not: bool,
    #[serde(default)]
    pub reup_on_met: bool,
    #[serde(default)]
    pub ignore_with_source: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Box<ConditionSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Box<ConditionSpec>>,
    #[serde(flatten)]
    pub params: ConditionParams,
}

impl ConditionSpec {
    pub fn new(type_tag: &str) -> Self {
        ConditionSpec {
            type_tag: type_tag.to_string(),
            not: false,
            reup_on_met: false,
            ignore_with_source: false,
            and: None,
            or: None,
            params: ConditionParams::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }
}

/// Constructs a payload from its parameters
pub type ConditionBuilder =
    Arc<dyn Fn(&ConditionParams) -> Result<ConditionKind, ConfigError> + Send + Sync>;

/// Maps condition type tags to payload constructors
#[derive(Clone)]
pub struct ConditionRegistry {
    builders: HashMap<String, ConditionBuilder>,
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.builders.keys().collect();
        tags.sort();
        f.debug_struct("ConditionRegistry").field("tags", &tags).finish()
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        let mut builders: HashMap<String, ConditionBuilder> = HashMap::new();
        builders.insert(
            "timed".to_string(),
            Arc::new(|params: &ConditionParams| TimedCondition::from_params(params).map(ConditionKind::Timed)),
        );
        builders.insert(
            "resource".to_string(),
            Arc::new(|params: &ConditionParams| ResourceCondition::from_params(params).map(ConditionKind::Resource)),
        );
        ConditionRegistry { builders }
    }
}

impl ConditionRegistry {
    /// Create a registry with the built-in `timed` and `resource` types
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new condition type
    pub fn register(&mut self, tag: &str, builder: ConditionBuilder) -> Result<(), ConfigError> {
        if self.builders.contains_key(tag) {
            return Err(ConfigError::DuplicateConditionType(tag.to_string()));
        }
        self.builders.insert(tag.to_string(), builder);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.builders.contains_key(tag)
    }

    /// Build an unregistered condition tree from its spec
    pub fn build(&self, spec: &ConditionSpec) -> Result<Condition, ConfigError> {
        let builder = self
            .builders
            .get(&spec.type_tag)
            .ok_or_else(|| ConfigError::UnknownConditionType(spec.type_tag.clone()))?;
        let mut condition = Condition::new(builder(&spec.params)?);
        condition.not = spec.not;
        condition.reup_on_met = spec.reup_on_met;
        condition.ignore_with_source = spec.ignore_with_source;
        if let Some(and) = spec.and.as_deref() {
            condition = condition.with_and(self.build(and)?);
        }
        if let Some(or) = spec.or.as_deref() {
            condition = condition.with_or(self.build(or)?);
        }
        Ok(condition)
    }

    /// Copy a tree, rebuilding every payload through its registered constructor
    ///
    /// Fails when the tree contains a type that was never registered here.
    pub fn clone_condition(&self, condition: &Condition) -> Result<Condition, ConfigError> {
        self.build(&condition.to_spec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::tests::MapReader;
    use crate::condition::CompareOp;
    use serde_json::json;

    /// Met while the watched stat is exactly zero
    #[derive(Debug, Clone)]
    struct Depleted {
        stat: StatType,
    }

    impl CustomCondition for Depleted {
        fn type_tag(&self) -> &str {
            "depleted"
        }

        fn evaluate(&self, stats: &dyn StatReader) -> bool {
            stats.current_value(&self.stat) <= 0.0
        }

        fn watched_stat(&self) -> Option<&StatType> {
            Some(&self.stat)
        }

        fn params(&self) -> ConditionParams {
            let mut params = ConditionParams::new();
            params.insert("stat".to_string(), json!(self.stat.0));
            params
        }

        fn box_clone(&self) -> Box<dyn CustomCondition> {
            Box::new(self.clone())
        }
    }

    fn depleted_builder() -> ConditionBuilder {
        Arc::new(|params: &ConditionParams| -> Result<ConditionKind, ConfigError> {
            let stat = params
                .get("stat")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ConfigError::InvalidConditionParams {
                    tag: "depleted".to_string(),
                    details: "missing stat".to_string(),
                })?;
            Ok(ConditionKind::Custom(Box::new(Depleted {
                stat: StatType::from(stat),
            })))
        })
    }

    #[test]
    fn test_build_nested_spec() {
        let registry = ConditionRegistry::new();
        let mut spec = ConditionSpec::new("timed").with_param("duration", json!(5.0));
        spec.or = Some(Box::new(
            ConditionSpec::new("resource")
                .with_param("stat", json!("mana"))
                .with_param("compare", json!("less"))
                .with_param("target", json!(10.0)),
        ));

        let cond = registry.build(&spec).unwrap();
        assert_eq!(cond.as_timed().unwrap().duration, 5.0);
        let or = cond.or().unwrap();
        assert!(matches!(
            or.kind(),
            ConditionKind::Resource(ResourceCondition { compare: CompareOp::Less, .. })
        ));
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        let registry = ConditionRegistry::new();
        let err = registry.build(&ConditionSpec::new("depleted"));
        assert!(matches!(err, Err(ConfigError::UnknownConditionType(tag)) if tag == "depleted"));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut registry = ConditionRegistry::new();
        let err = registry.register("timed", depleted_builder());
        assert!(matches!(err, Err(ConfigError::DuplicateConditionType(_))));
    }

    #[test]
    fn test_custom_type_round_trip() {
        let mut registry = ConditionRegistry::new();
        registry.register("depleted", depleted_builder()).unwrap();

        let original = Condition::custom(Box::new(Depleted {
            stat: StatType::from("health"),
        }))
        .negated();
        let mut copy = registry.clone_condition(&original).unwrap();
        assert!(copy.not);

        let reader = MapReader::new().with("health", 0.0, 100.0);
        copy.register(&reader);
        // depleted, then negated
        assert!(!copy.result());
    }

    #[test]
    fn test_clone_with_unregistered_custom_type_fails() {
        let registry = ConditionRegistry::new();
        let original = Condition::custom(Box::new(Depleted {
            stat: StatType::from("health"),
        }));
        assert!(registry.clone_condition(&original).is_err());
    }

    #[test]
    fn test_spec_from_toml() {
        let toml = r#"
type = "resource"
stat = "mana"
compare = "less_equals"
target = 20.0
is_percent = true
reup_on_met = true
"#;
        let spec: ConditionSpec = toml::from_str(toml).unwrap();
        assert!(spec.reup_on_met);
        let cond = ConditionRegistry::new().build(&spec).unwrap();
        match cond.kind() {
            ConditionKind::Resource(r) => {
                assert!(r.is_percent);
                assert_eq!(r.compare, CompareOp::LessEquals);
            }
            other => panic!("expected resource condition, got {:?}", other),
        }
    }

    #[test]
    fn test_to_spec_keeps_time_left() {
        let reader = MapReader::new();
        let mut cond = Condition::timed(5.0);
        cond.register(&reader);
        cond.tick(2.0, &reader);

        let spec = cond.to_spec();
        let rebuilt = ConditionRegistry::new().build(&spec).unwrap();
        assert_eq!(rebuilt.as_timed().unwrap().time_left, 3.0);
    }
}
