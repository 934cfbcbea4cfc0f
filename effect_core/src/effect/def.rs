//! Effect definitions

use crate::condition::Condition;
use crate::modifier::Modifier;
use crate::registry::EffectHook;
use crate::types::EffectType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a new sourceless stack merges into an existing one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StackMode {
    /// Add the incoming value to the first sourceless stack
    #[default]
    None,
    /// Restart the existing stack's duration, then merge
    Reup,
    /// Lengthen the existing stack's duration, then merge
    Extend,
    /// Keep every stack independent
    Multi,
}

/// Callback fired when one of a status effect's custom conditions is met
#[derive(Clone)]
pub struct CustomEffect {
    /// Condition watched while the effect is live
    pub condition: Condition,
    /// Runs each time the condition becomes met
    pub action: EffectHook,
}

impl fmt::Debug for CustomEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEffect")
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}

/// Immutable configuration of an effect type
#[derive(Clone)]
pub struct EffectDef {
    /// Effect type this definition describes
    pub id: EffectType,
    /// Cap on the summed value of stacks (0 = unlimited)
    pub max_stack: u32,
    /// How sourceless stacks combine
    pub stack_mode: StackMode,
    /// Duration given to stacks added without one
    pub duration: Option<Condition>,
    /// Stat modifiers applied while active, scaled by the active stack count
    pub modifiers: Vec<Modifier>,
    /// Condition-triggered actions, cloned per status effect
    pub custom_effects: Vec<CustomEffect>,
    /// Runs when the effect becomes active
    pub on_activate: Option<EffectHook>,
    /// Runs when the effect stops being active
    pub on_deactivate: Option<EffectHook>,
    /// Runs after a stack is added or merged
    pub on_add_stack: Option<EffectHook>,
}

impl fmt::Debug for EffectDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectDef")
            .field("id", &self.id)
            .field("max_stack", &self.max_stack)
            .field("stack_mode", &self.stack_mode)
            .field("duration", &self.duration)
            .field("modifiers", &self.modifiers)
            .field("custom_effects", &self.custom_effects)
            .finish_non_exhaustive()
    }
}

impl EffectDef {
    /// Create an uncapped `None`-mode definition with no duration
    pub fn new(id: impl Into<EffectType>) -> Self {
        EffectDef {
            id: id.into(),
            max_stack: 0,
            stack_mode: StackMode::None,
            duration: None,
            modifiers: Vec::new(),
            custom_effects: Vec::new(),
            on_activate: None,
            on_deactivate: None,
            on_add_stack: None,
        }
    }

    /// Set the stack cap (0 is uncapped)
    pub fn with_max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack;
        self
    }

    /// Set the stacking mode
    pub fn with_stack_mode(mut self, stack_mode: StackMode) -> Self {
        self.stack_mode = stack_mode;
        self
    }

    /// Set the duration given to stacks that arrive without one
    pub fn with_duration(mut self, duration: Condition) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Apply `modifier` (value per active stack) while the effect is active
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Add an action that runs when `condition` is met
    pub fn with_custom_effect(mut self, condition: Condition, action: EffectHook) -> Self {
        self.custom_effects.push(CustomEffect { condition, action });
        self
    }

    /// Set the activation hook
    pub fn on_activate(mut self, hook: EffectHook) -> Self {
        self.on_activate = Some(hook);
        self
    }

    /// Set the deactivation hook
    pub fn on_deactivate(mut self, hook: EffectHook) -> Self {
        self.on_deactivate = Some(hook);
        self
    }

    /// Set the hook run after each applied stack
    pub fn on_add_stack(mut self, hook: EffectHook) -> Self {
        self.on_add_stack = Some(hook);
        self
    }

    /// Remaining room under the stack cap for a given active count
    pub fn room(&self, active_count: u32) -> u32 {
        if self.max_stack == 0 {
            u32::MAX - active_count
        } else {
            self.max_stack.saturating_sub(active_count)
        }
    }

    /// Clamp a single stack value to the cap
    pub fn clamp(&self, value: u32) -> u32 {
        if self.max_stack == 0 {
            value
        } else {
            value.min(self.max_stack)
        }
    }
}
