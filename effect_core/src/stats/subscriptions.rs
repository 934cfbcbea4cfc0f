//! Condition subscriptions - timer processing and stat listeners

use super::Stats;
use crate::condition::{Condition, Subscriptions};
use crate::types::{ConditionOwner, StatType};
use log::trace;

/// Owners whose condition trees contain timers
///
/// While `process` walks the set, removals are buffered and applied once the
/// walk finishes, so the walk never sees the list shrink.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    owners: Vec<ConditionOwner>,
    pending_removal: Vec<ConditionOwner>,
    processing: u32,
}

impl TimerSet {
    pub(crate) fn insert(&mut self, owner: ConditionOwner) {
        self.pending_removal.retain(|o| o != &owner);
        if !self.owners.contains(&owner) {
            self.owners.push(owner);
        }
    }

    pub(crate) fn remove(&mut self, owner: &ConditionOwner) {
        if self.processing > 0 {
            if self.owners.contains(owner) && !self.pending_removal.contains(owner) {
                self.pending_removal.push(owner.clone());
            }
        } else {
            self.owners.retain(|o| o != owner);
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, owner: &ConditionOwner) -> bool {
        self.owners.contains(owner) && !self.pending_removal.contains(owner)
    }

    pub(crate) fn len(&self) -> usize {
        self.owners.len() - self.pending_removal.len()
    }

    /// Start a walk; returns how many owners it covers
    fn begin(&mut self) -> usize {
        self.processing += 1;
        self.owners.len()
    }

    fn get(&self, index: usize) -> Option<&ConditionOwner> {
        self.owners.get(index)
    }

    fn is_pending_removal(&self, owner: &ConditionOwner) -> bool {
        self.pending_removal.contains(owner)
    }

    fn finish(&mut self) {
        self.processing -= 1;
        if self.processing == 0 {
            let pending = std::mem::take(&mut self.pending_removal);
            self.owners.retain(|o| !pending.contains(o));
        }
    }
}

impl Stats {
    /// Advance every registered timer by `delta` seconds, exactly once each
    ///
    /// Timers registered while this runs are first ticked on the next call.
    pub fn process(&mut self, delta: f32) {
        let count = self.timers.begin();
        trace!("processing {} timer owners by {}s", count, delta);
        for index in 0..count {
            let Some(owner) = self.timers.get(index).cloned() else {
                break;
            };
            if self.timers.is_pending_removal(&owner) {
                continue;
            }
            let Some(mut condition) = self.take_condition(&owner) else {
                continue;
            };
            let changed = condition.tick(delta, &*self);
            self.restore_condition(&owner, condition);
            if changed {
                self.on_condition_changed(&owner);
            }
        }
        self.timers.finish();
    }

    /// Number of owners currently subscribed to timer ticks
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn subscribe(&mut self, owner: &ConditionOwner, subs: &Subscriptions) {
        if subs.timer {
            self.timers.insert(owner.clone());
        }
        for stat in &subs.stats {
            let owners = self.stat_listeners.entry(stat.clone()).or_default();
            if !owners.contains(owner) {
                owners.push(owner.clone());
            }
        }
    }

    pub(crate) fn unsubscribe(&mut self, owner: &ConditionOwner) {
        self.timers.remove(owner);
        for owners in self.stat_listeners.values_mut() {
            owners.retain(|o| o != owner);
        }
        self.stat_listeners.retain(|_, owners| !owners.is_empty());
    }

    /// Re-evaluate every condition watching `stat`
    pub(crate) fn refresh_stat_listeners(&mut self, stat: &StatType) {
        let Some(owners) = self.stat_listeners.get(stat).cloned() else {
            return;
        };
        for owner in owners {
            let still_listening = self
                .stat_listeners
                .get(stat)
                .is_some_and(|current| current.contains(&owner));
            if !still_listening {
                continue;
            }
            let Some(mut condition) = self.take_condition(&owner) else {
                continue;
            };
            let changed = condition.refresh_stat(stat, &*self);
            self.restore_condition(&owner, condition);
            if changed {
                self.on_condition_changed(&owner);
            }
        }
    }

    /// Move an owner's condition tree out so it can be evaluated against `&Stats`
    pub(crate) fn take_condition(&mut self, owner: &ConditionOwner) -> Option<Condition> {
        match owner {
            ConditionOwner::Modifier(stat, id) => self.modifiers.find_mut(stat, *id)?.duration.take(),
            ConditionOwner::Stack(effect, id) => self.effects.get_mut(effect)?.stack_mut(*id)?.duration.take(),
            ConditionOwner::Custom {
                effect,
                instance,
                index,
            } => self
                .effects
                .instance_mut(effect, *instance)?
                .custom_conditions
                .get_mut(*index)?
                .take(),
        }
    }

    pub(crate) fn restore_condition(&mut self, owner: &ConditionOwner, condition: Condition) {
        let slot = match owner {
            ConditionOwner::Modifier(stat, id) => self.modifiers.find_mut(stat, *id).map(|m| &mut m.duration),
            ConditionOwner::Stack(effect, id) => self
                .effects
                .get_mut(effect)
                .and_then(|se| se.stack_mut(*id))
                .map(|s| &mut s.duration),
            ConditionOwner::Custom {
                effect,
                instance,
                index,
            } => self
                .effects
                .instance_mut(effect, *instance)
                .and_then(|se| se.custom_conditions.get_mut(*index)),
        };
        if let Some(slot) = slot {
            *slot = Some(condition);
        }
    }

    /// A registered tree changed: let its owner react
    pub(crate) fn on_condition_changed(&mut self, owner: &ConditionOwner) {
        trace!("condition changed for {:?}", owner);
        match owner {
            ConditionOwner::Modifier(stat, id) => self.on_modifier_condition_changed(stat, *id),
            ConditionOwner::Stack(effect, id) => self.on_stack_condition_changed(effect, *id),
            ConditionOwner::Custom {
                effect,
                instance,
                index,
            } => self.on_custom_condition_changed(effect, *instance, *index),
        }
    }
}
