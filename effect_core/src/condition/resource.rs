//! Resource condition - compares a stat's current value against a threshold

use super::{ConditionParams, StatReader};
use crate::config::ConfigError;
use crate::types::StatType;
use serde::{Deserialize, Serialize};

/// Comparison used by a resource condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Less,
    LessEquals,
    Equals,
    NotEquals,
    GreaterEquals,
    Greater,
}

impl CompareOp {
    pub fn compare(self, a: f32, b: f32) -> bool {
        match self {
            CompareOp::Less => a < b,
            CompareOp::LessEquals => a <= b,
            CompareOp::Equals => (a - b).abs() < f32::EPSILON,
            CompareOp::NotEquals => (a - b).abs() >= f32::EPSILON,
            CompareOp::GreaterEquals => a >= b,
            CompareOp::Greater => a > b,
        }
    }
}

/// Threshold on a stat's current value
///
/// With `is_percent` the target is a percentage of the stat's computed
/// value (base plus modifiers), floored and never below 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCondition {
    pub stat: StatType,
    pub compare: CompareOp,
    pub target: f32,
    #[serde(default)]
    pub is_percent: bool,
}

impl ResourceCondition {
    pub fn new(stat: impl Into<StatType>, compare: CompareOp, target: f32, is_percent: bool) -> Self {
        ResourceCondition {
            stat: stat.into(),
            compare,
            target,
            is_percent,
        }
    }

    /// Absolute threshold for the current stat state
    pub fn effective_target(&self, stats: &dyn StatReader) -> f32 {
        if self.is_percent {
            let computed = stats.computed_value(&self.stat);
            (computed * self.target / 100.0).floor().max(1.0)
        } else {
            self.target
        }
    }

    pub fn evaluate(&self, stats: &dyn StatReader) -> bool {
        let current = stats.current_value(&self.stat);
        self.compare.compare(current, self.effective_target(stats))
    }

    pub(crate) fn from_params(params: &ConditionParams) -> Result<Self, ConfigError> {
        serde_json::from_value(serde_json::Value::Object(params.clone())).map_err(|e| {
            ConfigError::InvalidConditionParams {
                tag: "resource".to_string(),
                details: e.to_string(),
            }
        })
    }
}
