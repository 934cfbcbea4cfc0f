//! EffectLookup - live status effects keyed by effect type

use super::StatusEffect;
use crate::types::EffectType;
use std::collections::HashMap;

/// At most one live status effect per effect type
#[derive(Debug, Default)]
pub struct EffectLookup {
    effects: HashMap<EffectType, StatusEffect>,
}

impl EffectLookup {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the live status effect of a type
    pub fn get(&self, effect: &EffectType) -> Option<&StatusEffect> {
        self.effects.get(effect)
    }

    pub(crate) fn get_mut(&mut self, effect: &EffectType) -> Option<&mut StatusEffect> {
        self.effects.get_mut(effect)
    }

    /// Live instance of `effect`, if it is still the one numbered `instance`
    pub(crate) fn instance_mut(&mut self, effect: &EffectType, instance: u64) -> Option<&mut StatusEffect> {
        self.effects.get_mut(effect).filter(|se| se.instance == instance)
    }

    pub(crate) fn insert(&mut self, effect: StatusEffect) {
        self.effects.insert(effect.effect_type.clone(), effect);
    }

    pub(crate) fn remove(&mut self, effect: &EffectType) -> Option<StatusEffect> {
        self.effects.remove(effect)
    }

    /// Check whether a status effect of this type is live
    pub fn contains(&self, effect: &EffectType) -> bool {
        self.effects.contains_key(effect)
    }

    /// Iterate live status effects in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.values()
    }

    /// Get the types of every live status effect
    pub fn effect_types(&self) -> Vec<EffectType> {
        self.effects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
