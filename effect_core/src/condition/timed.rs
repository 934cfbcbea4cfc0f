//! Timed condition - met once its countdown reaches zero

use super::ConditionParams;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Countdown payload; the condition is met when `time_left <= 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedCondition {
    /// Configured duration in seconds
    pub duration: f32,
    /// Seconds remaining
    pub time_left: f32,
}

#[derive(Deserialize)]
struct TimedParams {
    duration: f32,
    #[serde(default)]
    time_left: Option<f32>,
}

impl TimedCondition {
    /// Create a timer that starts at its full duration
    pub fn new(duration: f32) -> Self {
        TimedCondition {
            duration,
            time_left: duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.time_left <= 0.0
    }

    /// Advance the countdown, never going below zero
    pub fn tick(&mut self, delta: f32) {
        self.time_left = (self.time_left - delta).max(0.0);
    }

    /// Restart the countdown
    pub fn reset(&mut self) {
        self.time_left = self.duration;
    }

    /// Add time to the countdown (used by extend stacking)
    pub fn extend(&mut self, seconds: f32) {
        self.time_left += seconds.max(0.0);
    }

    pub(crate) fn from_params(params: &ConditionParams) -> Result<Self, ConfigError> {
        let parsed: TimedParams = serde_json::from_value(serde_json::Value::Object(params.clone()))
            .map_err(|e| ConfigError::InvalidConditionParams {
                tag: "timed".to_string(),
                details: e.to_string(),
            })?;
        if parsed.duration < 0.0 {
            return Err(ConfigError::InvalidConditionParams {
                tag: "timed".to_string(),
                details: "duration must not be negative".to_string(),
            });
        }
        Ok(TimedCondition {
            duration: parsed.duration,
            time_left: parsed.time_left.unwrap_or(parsed.duration),
        })
    }
}
