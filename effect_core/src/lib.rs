//! effect_core - Stat, modifier and status effect aggregation for game entities
//!
//! This library provides:
//! - Stats: one entity's stat values, modifiers and status effects
//! - Modifier: an ordered operator application with an optional expiry condition
//! - Condition: composable boolean gates (timers, resource thresholds, custom payloads)
//! - StatusEffect: stacked effects with activation hooks and stacking modes
//! - Registry: process-wide configuration shared by every Stats
//!
//! The library uses the `log` facade and installs no logger.

pub mod condition;
pub mod config;
pub mod effect;
pub mod modifier;
pub mod operator;
pub mod pool;
pub mod prelude;
pub mod registry;
pub mod stats;
pub mod types;

// Re-export core types for convenience
pub use condition::{CompareOp, Condition, ConditionKind, ConditionRegistry, ConditionSpec, CustomCondition, StatReader};
pub use config::ConfigError;
pub use effect::{EffectDef, EffectStack, StackDef, StackMode, StatusEffect};
pub use modifier::{CalculateOptions, Modifier, ModifierDef};
pub use operator::{Operator, OperatorTable};
pub use pool::{Pool, Poolable};
pub use registry::Registry;
pub use stats::{Stat, Stats, StatsError, StatsSnapshot};
pub use types::{AddOutcome, EffectType, ModifierId, SourceId, StackId, StatType};
