//! EffectStack - one unit of a stacked status effect

use crate::condition::{Condition, ConditionRegistry, ConditionSpec, StatReader};
use crate::config::ConfigError;
use crate::pool::Poolable;
use crate::types::{SourceId, StackId};
use serde::{Deserialize, Serialize};

/// A stack of an effect: either one source's instances, or the merged value
/// of sourceless additions
#[derive(Debug, Default)]
pub struct EffectStack {
    /// Number of stacks this entry stands for
    pub value: u32,
    /// Expiry condition; `None` never expires
    pub duration: Option<Condition>,
    pub(crate) id: StackId,
    source: Option<SourceId>,
    is_active: bool,
    initialized: bool,
}

impl Clone for EffectStack {
    /// Copies the configuration only; the copy is uninitialized
    fn clone(&self) -> Self {
        EffectStack {
            value: self.value,
            duration: self.duration.clone(),
            ..Default::default()
        }
    }
}

impl Poolable for EffectStack {
    fn clear(&mut self) {
        *self = EffectStack::default();
    }
}

impl EffectStack {
    /// Create a stack with no duration of its own
    pub fn new(value: u32) -> Self {
        EffectStack {
            value,
            ..Default::default()
        }
    }

    /// Set the expiry condition
    pub fn with_duration(mut self, duration: Condition) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Get the handle assigned when the stack was added
    pub fn id(&self) -> StackId {
        self.id
    }

    /// Get the owning source, if any
    pub fn source(&self) -> Option<&SourceId> {
        self.source.as_ref()
    }

    /// Check whether an external source owns this stack
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Check whether the stack counts toward the effect
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Register the duration and compute the active state
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

    /// Unregister the duration; safe to call twice
    pub fn uninitialize(&mut self) {
        if !self.initialized {
            return;
        }
        self.initialized = false;
        if let Some(duration) = self.duration.as_mut() {
            duration.unregister();
        }
    }

    /// Recompute `is_active`; returns whether it flipped
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

    /// Create the serializable form, keeping timer progress
    pub fn to_def(&self) -> StackDef {
        StackDef {
            value: self.value,
            duration: self.duration.as_ref().map(Condition::to_spec),
            source: self.source.clone(),
        }
    }
}

/// Serializable stack configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDef {
    pub value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<ConditionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
}

impl StackDef {
    /// Create a stack from its serialized form
    pub fn build(&self, conditions: &ConditionRegistry) -> Result<EffectStack, ConfigError> {
        let mut stack = EffectStack::new(self.value);
        if let Some(spec) = self.duration.as_ref() {
            stack.duration = Some(conditions.build(spec)?);
        }
        Ok(stack)
    }
}
