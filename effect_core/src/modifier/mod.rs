//! Modifier - a single operator application to a stat

mod calculate;
mod lookup;

pub use calculate::{calculate, CalculateOptions};
pub use lookup::ModifierLookup;

use crate::condition::{Condition, ConditionRegistry, ConditionSpec, StatReader};
use crate::config::ConfigError;
use crate::operator::Operator;
use crate::pool::Poolable;
use crate::types::{ModifierId, SourceId, StatType};
use serde::{Deserialize, Serialize};

/// A live modifier
///
/// `is_active` is the cached `!duration.check_all(has_source)` and is only
/// recomputed when the duration reports a change.
#[derive(Debug)]
pub struct Modifier {
    /// Stat this modifier applies to
    pub stat_type: StatType,
    /// How the value folds into the stat
    pub op: Operator,
    /// Operand passed to the operator
    pub value: f32,
    /// Skipped when calculating with `ignore_hidden`
    pub is_hidden: bool,
    /// Expiry condition; `None` never expires
    pub duration: Option<Condition>,
    pub(crate) id: ModifierId,
    source: Option<SourceId>,
    is_active: bool,
    initialized: bool,
}

impl Default for Modifier {
    fn default() -> Self {
        Modifier {
            stat_type: StatType::default(),
            op: Operator::Add,
            value: 0.0,
            is_hidden: false,
            duration: None,
            id: ModifierId::default(),
            source: None,
            is_active: false,
            initialized: false,
        }
    }
}

impl Clone for Modifier {
    /// Copies the configuration only; the copy is uninitialized
    fn clone(&self) -> Self {
        let mut copy = Modifier::default();
        copy.copy_from(self);
        copy
    }
}

impl Poolable for Modifier {
    fn clear(&mut self) {
        *self = Modifier::default();
    }
}

impl Modifier {
    /// Create a permanent, visible modifier
    pub fn new(stat_type: impl Into<StatType>, op: Operator, value: f32) -> Self {
        Modifier {
            stat_type: stat_type.into(),
            op,
            value,
            ..Default::default()
        }
    }

    /// Set the expiry condition
    pub fn with_duration(mut self, duration: Condition) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Mark the modifier hidden
    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// Get the handle assigned when the modifier was added
    pub fn id(&self) -> ModifierId {
        self.id
    }

    /// Get the owning source, if any
    pub fn source(&self) -> Option<&SourceId> {
        self.source.as_ref()
    }

    /// Check whether an external source owns this modifier
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Check whether the modifier currently contributes
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Check whether the duration is registered against a Stats
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Attach to a host: register the duration and compute the active state
    pub fn initialize(&mut self, stats: &dyn StatReader, source: Option<SourceId>) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.source = source;
        if let Some(duration) = self.duration.as_mut() {
            duration.register(stats);
        }
        self.refresh_active();
    }

    /// Detach from the host
    pub fn uninitialize(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        if let Some(duration) = self.duration.as_mut() {
            duration.unregister();
        }
    }

    /// Recompute `is_active` from the duration; returns whether it flipped
    pub fn refresh_active(&mut self) -> bool {
        let has_source = self.source.is_some();
        let active = match self.duration.as_ref() {
            Some(duration) => !duration.check_all(has_source),
            None => true,
        };
        let changed = active != self.is_active;
        self.is_active = active;
        changed
    }

    /// Copy the configuration of `other` into this (pooled) modifier
    pub(crate) fn copy_from(&mut self, other: &Modifier) {
        self.stat_type = other.stat_type.clone();
        self.op = other.op.clone();
        self.value = other.value;
        self.is_hidden = other.is_hidden;
        self.duration = other.duration.clone();
    }

    /// Create the serializable form, keeping timer progress
    pub fn to_def(&self) -> ModifierDef {
        ModifierDef {
            stat: self.stat_type.clone(),
            op: self.op.clone(),
            value: self.value,
            is_hidden: self.is_hidden,
            duration: self.duration.as_ref().map(Condition::to_spec),
            source: self.source.clone(),
        }
    }
}

/// Serializable modifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierDef {
    pub stat: StatType,
    pub op: Operator,
    pub value: f32,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<ConditionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
}

impl ModifierDef {
    /// Build an uninitialized modifier; the source is applied when it is added
    pub fn build(&self, conditions: &ConditionRegistry) -> Result<Modifier, ConfigError> {
        let mut modifier = Modifier::new(self.stat.clone(), self.op.clone(), self.value);
        modifier.is_hidden = self.is_hidden;
        if let Some(spec) = self.duration.as_ref() {
            modifier.duration = Some(conditions.build(spec)?);
        }
        Ok(modifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::tests::MapReader;

    #[test]
    fn test_without_duration_is_active() {
        let mut m = Modifier::new("health", Operator::Add, 10.0);
        m.initialize(&MapReader::new(), None);
        assert!(m.is_active());
    }

    #[test]
    fn test_expired_duration_is_inactive() {
        let reader = MapReader::new();
        let mut m = Modifier::new("health", Operator::Add, 10.0).with_duration(Condition::timed(2.0));
        m.initialize(&reader, None);
        assert!(m.is_active());

        m.duration.as_mut().unwrap().tick(2.0, &reader);
        assert!(m.refresh_active());
        assert!(!m.is_active());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let reader = MapReader::new();
        let mut m = Modifier::new("health", Operator::Add, 10.0);
        m.initialize(&reader, Some(SourceId::from("sword")));
        m.initialize(&reader, None);
        assert_eq!(m.source(), Some(&SourceId::from("sword")));

        m.uninitialize();
        m.uninitialize();
        assert!(!m.is_initialized());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut m = Modifier::new("health", Operator::Max, 10.0)
            .hidden()
            .with_duration(Condition::timed(1.0));
        m.initialize(&MapReader::new(), Some(SourceId::from("x")));
        m.clear();
        assert!(m.duration.is_none());
        assert!(m.source().is_none());
        assert!(!m.is_active());
        assert!(!m.is_hidden);
    }

    #[test]
    fn test_def_round_trip() {
        let def = ModifierDef {
            stat: StatType::from("armour"),
            op: Operator::PercentAdd,
            value: 0.25,
            is_hidden: false,
            duration: Some(
                ConditionSpec::new("timed")
                    .with_param("duration", serde_json::json!(4.0))
                    .with_param("time_left", serde_json::json!(4.0)),
            ),
            source: None,
        };
        let modifier = def.build(&ConditionRegistry::new()).unwrap();
        assert_eq!(modifier.to_def(), def);
    }
}
