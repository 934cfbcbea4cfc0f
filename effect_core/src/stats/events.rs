//! Public change notifications

use super::Stats;
use crate::types::{EffectType, StatType};

/// Listener for stat-changed notifications
pub type StatListener = Box<dyn FnMut(&Stats, &StatType)>;

/// Listener for status-effect-changed and effect-stack-changed notifications
pub type EffectListener = Box<dyn FnMut(&Stats, &EffectType)>;

#[derive(Default)]
pub(crate) struct Events {
    stat_changed: Vec<StatListener>,
    status_effect_changed: Vec<EffectListener>,
    effect_stack_changed: Vec<EffectListener>,
}

impl Stats {
    /// Called whenever a stat's stored value or modifier set changes
    pub fn on_stat_changed(&mut self, listener: impl FnMut(&Stats, &StatType) + 'static) {
        self.events.stat_changed.push(Box::new(listener));
    }

    /// Called when a status effect activates, deactivates or is removed
    pub fn on_status_effect_changed(&mut self, listener: impl FnMut(&Stats, &EffectType) + 'static) {
        self.events.status_effect_changed.push(Box::new(listener));
    }

    /// Called when a stack is added, merged, removed or changes activity
    pub fn on_effect_stack_changed(&mut self, listener: impl FnMut(&Stats, &EffectType) + 'static) {
        self.events.effect_stack_changed.push(Box::new(listener));
    }

    /// Notify listeners, then re-evaluate conditions watching `stat`
    pub(crate) fn raise_stat_changed(&mut self, stat: &StatType) {
        // Listeners only see `&Stats`, so none can be added while these run
        let mut listeners = std::mem::take(&mut self.events.stat_changed);
        for listener in listeners.iter_mut() {
            listener(self, stat);
        }
        self.events.stat_changed = listeners;

        self.refresh_stat_listeners(stat);
    }

    pub(crate) fn raise_status_effect_changed(&mut self, effect: &EffectType) {
        let mut listeners = std::mem::take(&mut self.events.status_effect_changed);
        for listener in listeners.iter_mut() {
            listener(self, effect);
        }
        self.events.status_effect_changed = listeners;
    }

    pub(crate) fn raise_effect_stack_changed(&mut self, effect: &EffectType) {
        let mut listeners = std::mem::take(&mut self.events.effect_stack_changed);
        for listener in listeners.iter_mut() {
            listener(self, effect);
        }
        self.events.effect_stack_changed = listeners;
    }
}
