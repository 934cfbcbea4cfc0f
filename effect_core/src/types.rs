//! Identifier types shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier naming a numeric gameplay attribute (e.g. "health")
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatType(pub String);

impl From<&str> for StatType {
    fn from(s: &str) -> Self {
        StatType(s.to_string())
    }
}

impl From<String> for StatType {
    fn from(s: String) -> Self {
        StatType(s)
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier naming a status effect type (e.g. "poison")
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectType(pub String);

impl EffectType {
    /// An effect type doubles as a stat type so modifiers can be routed into it
    pub fn as_stat(&self) -> StatType {
        StatType(self.0.clone())
    }
}

impl From<&str> for EffectType {
    fn from(s: &str) -> Self {
        EffectType(s.to_string())
    }
}

impl From<String> for EffectType {
    fn from(s: String) -> Self {
        EffectType(s)
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque external owner of a modifier or stack
///
/// A sourced entry is never removed on expiry; the owner removes it
/// explicitly through one of the `*_by_source` calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    /// Source tag used for the stat modifiers a status effect applies while active
    pub fn for_effect(effect: &EffectType) -> Self {
        SourceId(format!("{}{}", EFFECT_SOURCE_PREFIX, effect.0))
    }

    /// Whether this source tags modifiers applied by a status effect
    pub fn is_effect_source(&self) -> bool {
        self.0.starts_with(EFFECT_SOURCE_PREFIX)
    }
}

const EFFECT_SOURCE_PREFIX: &str = "effect:";

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        SourceId(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        SourceId(s)
    }
}

/// Handle to a live modifier inside a `Stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierId(pub u64);

/// Handle to a live stack inside a status effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackId(pub u64);

/// The slot that holds a registered condition tree and receives its change notifications
///
/// Handles are never reused within one `Stats`, so a stale owner simply misses on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionOwner {
    /// Duration of a modifier
    Modifier(StatType, ModifierId),
    /// Duration of an effect stack
    Stack(EffectType, StackId),
    /// One of a status effect's custom conditions
    Custom {
        effect: EffectType,
        instance: u64,
        index: usize,
    },
}

/// What happened to a modifier or stack handed to `Stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Inserted into a stat's modifier list
    Modifier(ModifierId),
    /// Appended as a new stack
    Stack(StackId),
    /// Merged into an existing stack; the incoming one was released
    Merged(StackId),
    /// Dropped: already expired on arrival, or empty after clamping to the stack cap
    Discarded,
}

impl AddOutcome {
    /// Whether the addition had any effect
    pub fn is_applied(&self) -> bool {
        !matches!(self, AddOutcome::Discarded)
    }
}
