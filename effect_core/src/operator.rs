//! Operator table - fold functions and priority order for modifiers

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Fold function for a custom operator: `(accumulator, modifier value) -> accumulator`
pub type OperatorFn = Arc<dyn Fn(f32, f32) -> f32 + Send + Sync>;

/// How a modifier's value is folded into a stat
///
/// Serialized as a snake_case string; anything that is not a built-in
/// name is treated as a custom operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// a + b, applied before every other operator
    BaseAdd,
    /// a + b
    Add,
    /// Summed across a contiguous run, then applied as a * (1 + sum)
    PercentAdd,
    /// a * (1 + b)
    PercentMult,
    /// -a
    Negate,
    Max,
    Min,
    /// b
    Replace,
    Zero,
    One,
    Custom(String),
}

impl Operator {
    pub fn name(&self) -> &str {
        match self {
            Operator::BaseAdd => "base_add",
            Operator::Add => "add",
            Operator::PercentAdd => "percent_add",
            Operator::PercentMult => "percent_mult",
            Operator::Negate => "negate",
            Operator::Max => "max",
            Operator::Min => "min",
            Operator::Replace => "replace",
            Operator::Zero => "zero",
            Operator::One => "one",
            Operator::Custom(name) => name,
        }
    }

    /// Built-in operators in their default priority order
    pub fn builtins() -> &'static [Operator] {
        &[
            Operator::BaseAdd,
            Operator::Add,
            Operator::PercentAdd,
            Operator::PercentMult,
            Operator::Negate,
            Operator::Max,
            Operator::Min,
            Operator::Replace,
            Operator::Zero,
            Operator::One,
        ]
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "base_add" => Operator::BaseAdd,
            "add" => Operator::Add,
            "percent_add" => Operator::PercentAdd,
            "percent_mult" => Operator::PercentMult,
            "negate" => Operator::Negate,
            "max" => Operator::Max,
            "min" => Operator::Min,
            "replace" => Operator::Replace,
            "zero" => Operator::Zero,
            "one" => Operator::One,
            _ => Operator::Custom(s),
        }
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Operator::from(s.to_string())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.name().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps operators to fold functions and a stable total order
#[derive(Clone)]
pub struct OperatorTable {
    /// Operators in application order
    order: Vec<Operator>,
    custom: HashMap<String, OperatorFn>,
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorTable")
            .field("order", &self.order)
            .finish()
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        OperatorTable {
            order: Operator::builtins().to_vec(),
            custom: HashMap::new(),
        }
    }
}

impl OperatorTable {
    /// Create a table holding only the built-in operators
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom operator
    ///
    /// With `priority` the operator is inserted at that index of the order,
    /// otherwise it is appended and applies after everything else.
    pub fn register(
        &mut self,
        name: &str,
        priority: Option<usize>,
        fold: OperatorFn,
    ) -> Result<(), ConfigError> {
        let op = Operator::from(name);
        if self.order.contains(&op) {
            return Err(ConfigError::DuplicateOperator(name.to_string()));
        }
        match priority {
            Some(index) => self.order.insert(index.min(self.order.len()), op),
            None => self.order.push(op),
        }
        self.custom.insert(name.to_string(), fold);
        Ok(())
    }

    /// Sort key for an operator; unknown operators return -1 and sort first
    pub fn order(&self, op: &Operator) -> i32 {
        self.order
            .iter()
            .position(|o| o == op)
            .map(|i| i as i32)
            .unwrap_or(-1)
    }

    /// Fold `b` into `a`; unknown operators return `a` unchanged
    pub fn compute(&self, op: &Operator, a: f32, b: f32) -> f32 {
        match op {
            Operator::BaseAdd | Operator::Add | Operator::PercentAdd => a + b,
            Operator::PercentMult => a * (1.0 + b),
            Operator::Negate => -a,
            Operator::Max => a.max(b),
            Operator::Min => a.min(b),
            Operator::Replace => b,
            Operator::Zero => 0.0,
            Operator::One => 1.0,
            Operator::Custom(name) => match self.custom.get(name) {
                Some(fold) => fold(a, b),
                None => {
                    log::warn!("unknown operator '{}', leaving value unchanged", name);
                    a
                }
            },
        }
    }

    pub fn contains(&self, op: &Operator) -> bool {
        self.order.contains(op)
    }
}
