//! Prelude module for convenient imports
//!
//! ```rust
//! use effect_core::prelude::*;
//! ```

// Core types
pub use crate::stats::{Stat, Stats, StatsError};
pub use crate::types::{AddOutcome, EffectType, ModifierId, SourceId, StackId, StatType};

// Modifiers
pub use crate::modifier::{CalculateOptions, Modifier};
pub use crate::operator::Operator;

// Conditions
pub use crate::condition::{CompareOp, Condition};

// Status effects
pub use crate::effect::{EffectDef, EffectStack, StackMode};

// Config
pub use crate::config::ConfigError;
pub use crate::registry::{EffectHook, Registry};
