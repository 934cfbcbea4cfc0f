//! Modifier management on Stats

use super::Stats;
use crate::condition::Condition;
use crate::modifier::Modifier;
use crate::types::{AddOutcome, ConditionOwner, EffectType, ModifierId, SourceId, StatType};
use log::{debug, trace};
use std::collections::BTreeSet;

impl Stats {
    /// Take a cleared modifier from the pool to fill in and pass to `add_mod`
    pub fn acquire_modifier(&mut self) -> Modifier {
        self.modifier_pool.acquire()
    }

    /// Add a modifier
    ///
    /// If the stat type names a registered effect, the modifier becomes a
    /// stack of that effect with `value` rounded to a whole count.
    pub fn add_mod(&mut self, mut modifier: Modifier, source: Option<SourceId>) -> AddOutcome {
        let effect = EffectType(modifier.stat_type.0.clone());
        if let Some(def) = self.registry.effect(&effect).cloned() {
            let mut stack = self.stack_pool.acquire();
            stack.value = modifier.value.max(0.0).round() as u32;
            stack.duration = modifier.duration.take();
            self.modifier_pool.release(modifier);
            return self.add_stack_with_def(&def, stack, source);
        }
        self.insert_modifier(modifier, source)
    }

    pub(crate) fn insert_modifier(&mut self, mut modifier: Modifier, source: Option<SourceId>) -> AddOutcome {
        let id = ModifierId(self.next_handle());
        modifier.id = id;
        modifier.initialize(&*self, source);
        if !modifier.is_active() && !modifier.has_source() {
            debug!(
                "modifier on '{}' expired before it was added, releasing",
                modifier.stat_type
            );
            modifier.uninitialize();
            self.modifier_pool.release(modifier);
            return AddOutcome::Discarded;
        }

        let stat = modifier.stat_type.clone();
        let subs = modifier.duration.as_ref().map(Condition::subscriptions);
        self.modifiers.insert(modifier, self.registry.operators());
        if let Some(subs) = subs {
            self.subscribe(&ConditionOwner::Modifier(stat.clone(), id), &subs);
        }
        trace!("added modifier {:?} to '{}'", id, stat);
        self.raise_stat_changed(&stat);
        AddOutcome::Modifier(id)
    }

    /// Remove one modifier; returns false if it is already gone
    pub fn remove_mod(&mut self, id: ModifierId) -> bool {
        let Some(stat) = self.modifiers.stat_of(id).cloned() else {
            return false;
        };
        self.remove_mod_entry(&stat, id)
    }

    pub(crate) fn remove_mod_entry(&mut self, stat: &StatType, id: ModifierId) -> bool {
        let Some(mut modifier) = self.modifiers.remove(stat, id) else {
            return false;
        };
        modifier.uninitialize();
        self.unsubscribe(&ConditionOwner::Modifier(stat.clone(), id));
        self.modifier_pool.release(modifier);
        trace!("removed modifier {:?} from '{}'", id, stat);
        self.raise_stat_changed(stat);
        true
    }

    /// Remove every modifier added with `source`; returns how many were removed
    pub fn remove_mods_by_source(&mut self, source: &SourceId) -> usize {
        let removed = self.modifiers.remove_by_source(source);
        if removed.is_empty() {
            return 0;
        }
        let count = removed.len();
        let mut touched = BTreeSet::new();
        for mut modifier in removed {
            modifier.uninitialize();
            self.unsubscribe(&ConditionOwner::Modifier(modifier.stat_type.clone(), modifier.id));
            touched.insert(modifier.stat_type.clone());
            self.modifier_pool.release(modifier);
        }
        debug!("removed {} modifiers from source '{}'", count, source.0);
        for stat in touched {
            self.raise_stat_changed(&stat);
        }
        count
    }

    /// Copy another entity's modifiers as fresh entries here
    ///
    /// With a filter only modifiers from that source are copied. Modifiers a
    /// status effect applies are never copied; they follow the effect.
    pub fn copy_mods_from(&mut self, other: &Stats, source: Option<&SourceId>) -> usize {
        let originals: Vec<&Modifier> = other
            .modifiers
            .filter_by_source(source)
            .filter(|m| !m.source().is_some_and(SourceId::is_effect_source))
            .collect();
        let mut copied = 0;
        for original in originals {
            let mut copy = self.modifier_pool.acquire();
            copy.copy_from(original);
            if self.insert_modifier(copy, original.source().cloned()).is_applied() {
                copied += 1;
            }
        }
        copied
    }

    /// Modifiers of one stat in application order
    pub fn modifiers(&self, stat: &StatType) -> &[Modifier] {
        self.modifiers.get(stat)
    }

    pub fn modifier(&self, id: ModifierId) -> Option<&Modifier> {
        let stat = self.modifiers.stat_of(id)?;
        self.modifiers.find(stat, id)
    }

    /// Total number of live modifiers
    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// A duration changed: deactivate, and remove if self-managed
    pub(crate) fn on_modifier_condition_changed(&mut self, stat: &StatType, id: ModifierId) {
        let Some(modifier) = self.modifiers.find_mut(stat, id) else {
            return;
        };
        if !modifier.refresh_active() {
            return;
        }
        let (active, sourced) = (modifier.is_active(), modifier.has_source());
        trace!("modifier {:?} on '{}' is now active={}", id, stat, active);
        if !active && !sourced {
            self.remove_mod_entry(stat, id);
        } else {
            self.raise_stat_changed(stat);
        }
    }
}
