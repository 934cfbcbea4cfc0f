//! StatusEffect - the live instance of an effect type on one entity

use super::EffectStack;
use crate::condition::Condition;
use crate::pool::Poolable;
use crate::types::{EffectType, SourceId, StackId};

/// Live stacks and activation state of one effect type
///
/// `is_active == active_stack_count > 0 && !immune`. The owning `Stats`
/// drives every transition; this type only stores state.
#[derive(Debug, Default)]
pub struct StatusEffect {
    pub(crate) effect_type: EffectType,
    pub(crate) instance: u64,
    pub(crate) stacks: Vec<EffectStack>,
    /// Taken out while being evaluated, hence the `Option`
    pub(crate) custom_conditions: Vec<Option<Condition>>,
    pub(crate) active_stack_count: u32,
    pub(crate) is_active: bool,
}

impl Poolable for StatusEffect {
    fn clear(&mut self) {
        self.effect_type = EffectType::default();
        self.instance = 0;
        self.stacks.clear();
        self.custom_conditions.clear();
        self.active_stack_count = 0;
        self.is_active = false;
    }
}

impl StatusEffect {
    /// Get the effect type
    pub fn effect_type(&self) -> &EffectType {
        &self.effect_type
    }

    /// Get every stack, active or not
    pub fn stacks(&self) -> &[EffectStack] {
        &self.stacks
    }

    /// Get the summed value of active stacks
    pub fn active_stack_count(&self) -> u32 {
        self.active_stack_count
    }

    /// Check whether the effect is applied
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Number of stacks held, active or not
    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    /// Get a stack by handle
    pub fn stack(&self, id: StackId) -> Option<&EffectStack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    pub(crate) fn stack_mut(&mut self, id: StackId) -> Option<&mut EffectStack> {
        self.stacks.iter_mut().find(|s| s.id == id)
    }

    /// Get the condition of a custom effect by index
    pub fn custom_condition(&self, index: usize) -> Option<&Condition> {
        self.custom_conditions.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn first_sourceless(&self) -> Option<StackId> {
        self.stacks.iter().find(|s| !s.has_source()).map(|s| s.id)
    }

    pub(crate) fn remove_stack(&mut self, id: StackId) -> Option<EffectStack> {
        let index = self.stacks.iter().position(|s| s.id == id)?;
        Some(self.stacks.remove(index))
    }

    pub(crate) fn stacks_from(&self, source: &SourceId) -> Vec<StackId> {
        self.stacks
            .iter()
            .filter(|s| s.source() == Some(source))
            .map(|s| s.id)
            .collect()
    }

    pub(crate) fn sourceless_stacks(&self) -> Vec<StackId> {
        self.stacks
            .iter()
            .filter(|s| !s.has_source())
            .map(|s| s.id)
            .collect()
    }

    /// Sum of the values of active stacks
    pub(crate) fn sum_active_values(&self) -> u32 {
        let total: u64 = self
            .stacks
            .iter()
            .filter(|s| s.is_active())
            .map(|s| u64::from(s.value))
            .sum();
        assert!(
            total <= u64::from(u32::MAX),
            "active stack count of '{}' overflowed",
            self.effect_type
        );
        total as u32
    }
}
