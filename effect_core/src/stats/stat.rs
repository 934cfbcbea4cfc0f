//! Stat - stored base and current value of one stat type

use serde::{Deserialize, Serialize};

/// Base and current value of a stat
///
/// `base_value` feeds the modifier fold; `current_value` tracks depletable
/// resources (current health, current mana) against that calculated maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub base_value: f32,
    pub current_value: f32,
}

impl Stat {
    /// A stat whose base and current value both start at `value`
    pub fn new(value: f32) -> Self {
        Stat {
            base_value: value,
            current_value: value,
        }
    }
}
