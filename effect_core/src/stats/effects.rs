//! Status effect management on Stats - stacking, activation and custom effects

use super::{Stats, StatsError};
use crate::condition::Condition;
use crate::effect::{EffectDef, EffectStack, StackMode, StatusEffect};
use crate::types::{AddOutcome, ConditionOwner, EffectType, SourceId, StackId};
use log::{debug, trace};
use std::sync::Arc;

impl Stats {
    /// Take a cleared stack from the pool to fill in and pass to `add_stack`
    pub fn acquire_stack(&mut self) -> EffectStack {
        self.stack_pool.acquire()
    }

    /// Add a stack to the effect's status effect, creating it if needed
    pub fn add_stack(
        &mut self,
        effect: &EffectType,
        stack: EffectStack,
        source: Option<SourceId>,
    ) -> Result<AddOutcome, StatsError> {
        let Some(def) = self.registry.effect(effect).cloned() else {
            self.stack_pool.release(stack);
            return Err(StatsError::UnknownEffect(effect.clone()));
        };
        Ok(self.add_stack_with_def(&def, stack, source))
    }

    pub(crate) fn add_stack_with_def(
        &mut self,
        def: &Arc<EffectDef>,
        mut stack: EffectStack,
        source: Option<SourceId>,
    ) -> AddOutcome {
        let effect = def.id.clone();
        let created = self.ensure_status_effect(def);

        if stack.duration.is_none() {
            stack.duration = def.duration.clone();
        }
        stack.id = StackId(self.next_handle());
        stack.initialize(&*self, source);

        let outcome = if !stack.is_active() && !stack.has_source() {
            debug!("stack of '{}' expired before it was added, releasing", effect);
            self.release_stack(stack);
            AddOutcome::Discarded
        } else if stack.has_source() {
            self.push_stack(&effect, stack)
        } else if def.stack_mode == StackMode::Multi {
            let room = def.room(self.active_stack_count(&effect));
            stack.value = stack.value.min(room);
            if stack.value == 0 {
                debug!("'{}' has no room for the stack (cap {}), discarding", effect, def.max_stack);
                self.release_stack(stack);
                AddOutcome::Discarded
            } else {
                self.push_stack(&effect, stack)
            }
        } else {
            match self.effects.get(&effect).and_then(StatusEffect::first_sourceless) {
                Some(target) => self.merge_stack(def, target, stack),
                None => {
                    stack.value = def.clamp(stack.value);
                    if stack.value == 0 {
                        debug!("empty stack of '{}' has nothing to merge into, discarding", effect);
                        self.release_stack(stack);
                        AddOutcome::Discarded
                    } else {
                        self.push_stack(&effect, stack)
                    }
                }
            }
        };

        if outcome.is_applied() {
            self.raise_effect_stack_changed(&effect);
            self.refresh_status_effect(&effect);
            if let Some(hook) = def.on_add_stack.clone() {
                hook(self, &effect);
            }
        } else if created {
            self.remove_if_empty(&effect);
        }
        outcome
    }

    /// Create the live status effect and register its custom conditions
    ///
    /// Returns false if one already exists.
    fn ensure_status_effect(&mut self, def: &EffectDef) -> bool {
        if self.effects.contains(&def.id) {
            return false;
        }
        let mut status = self.effect_pool.acquire();
        status.effect_type = def.id.clone();
        status.instance = self.next_handle();
        status.stacks = self.stack_pool.acquire_list();

        let mut subscriptions = Vec::with_capacity(def.custom_effects.len());
        for custom in &def.custom_effects {
            let mut condition = custom.condition.clone();
            condition.register(&*self);
            subscriptions.push(condition.subscriptions());
            status.custom_conditions.push(Some(condition));
        }
        let instance = status.instance;
        self.effects.insert(status);

        for (index, subs) in subscriptions.iter().enumerate() {
            let owner = ConditionOwner::Custom {
                effect: def.id.clone(),
                instance,
                index,
            };
            self.subscribe(&owner, subs);
        }
        debug!("created status effect '{}'", def.id);
        true
    }

    fn push_stack(&mut self, effect: &EffectType, stack: EffectStack) -> AddOutcome {
        let id = stack.id;
        let subs = stack.duration.as_ref().map(Condition::subscriptions);
        let Some(status) = self.effects.get_mut(effect) else {
            self.release_stack(stack);
            return AddOutcome::Discarded;
        };
        status.stacks.push(stack);
        if let Some(subs) = subs {
            self.subscribe(&ConditionOwner::Stack(effect.clone(), id), &subs);
        }
        trace!("appended stack {:?} to '{}'", id, effect);
        AddOutcome::Stack(id)
    }

    /// Fold an incoming sourceless stack into an existing one
    fn merge_stack(&mut self, def: &EffectDef, target: StackId, incoming: EffectStack) -> AddOutcome {
        let effect = &def.id;
        let owner = ConditionOwner::Stack(effect.clone(), target);

        if let Some(mut existing) = self.take_condition(&owner) {
            match def.stack_mode {
                StackMode::Reup => existing.reup(&*self),
                StackMode::Extend => {
                    if let Some(extra) = incoming.duration.as_ref() {
                        self.extend_duration(&mut existing, extra);
                    }
                }
                StackMode::None | StackMode::Multi => {}
            }
            let subs = existing.subscriptions();
            self.restore_condition(&owner, existing);
            self.subscribe(&owner, &subs);
        }

        let added = incoming.value;
        self.release_stack(incoming);

        let Some(stack) = self.effects.get_mut(effect).and_then(|se| se.stack_mut(target)) else {
            return AddOutcome::Discarded;
        };
        stack.value = def.clamp(stack.value.saturating_add(added));
        let flipped = stack.refresh_active();
        trace!("merged {} into stack {:?} of '{}'", added, target, effect);
        if flipped {
            self.stack_activity_changed(effect, target);
        }
        AddOutcome::Merged(target)
    }

    /// Extend stacking: add time to two timers, otherwise OR the incoming tree on
    fn extend_duration(&self, existing: &mut Condition, extra: &Condition) {
        let extra_time = extra.as_timed().map(|t| t.time_left);
        match (existing.as_timed().is_some(), extra_time) {
            (true, Some(seconds)) => {
                if let Some(timer) = existing.as_timed_mut() {
                    timer.extend(seconds);
                }
                existing.recompute(self);
            }
            _ => {
                let mut branch = extra.clone();
                branch.register(self);
                existing.append_or(branch);
            }
        }
    }

    /// Remove one stack; returns false if it is already gone
    pub fn remove_stack(&mut self, effect: &EffectType, id: StackId) -> bool {
        if !self.detach_stack(effect, id) {
            return false;
        }
        self.raise_effect_stack_changed(effect);
        self.refresh_status_effect(effect);
        true
    }

    /// Remove every stack of `effect` added with `source`
    pub fn remove_stacks_by_source(&mut self, effect: &EffectType, source: &SourceId) -> usize {
        let ids = match self.effects.get(effect) {
            Some(status) => status.stacks_from(source),
            None => return 0,
        };
        let removed = ids.into_iter().filter(|id| self.detach_stack(effect, *id)).count();
        if removed > 0 {
            debug!("removed {} stacks of '{}' from source '{}'", removed, effect, source.0);
            self.raise_effect_stack_changed(effect);
            self.refresh_status_effect(effect);
        }
        removed
    }

    /// Swap a source's stacks of `effect` for a new one
    ///
    /// The old stacks go first, so the effect may deactivate and reactivate.
    pub fn replace_stack(
        &mut self,
        effect: &EffectType,
        stack: EffectStack,
        source: Option<SourceId>,
    ) -> Result<AddOutcome, StatsError> {
        if self.registry.effect(effect).is_none() {
            self.stack_pool.release(stack);
            return Err(StatsError::UnknownEffect(effect.clone()));
        }
        if let Some(source) = source.as_ref() {
            self.remove_stacks_by_source(effect, source);
        }
        self.add_stack(effect, stack, source)
    }

    /// Take up to `amount` off sourceless stacks, newest first
    ///
    /// Stacks that reach zero are removed. Returns how much was taken.
    pub fn reduce_stacks(&mut self, effect: &EffectType, amount: u32) -> u32 {
        let Some(status) = self.effects.get_mut(effect) else {
            return 0;
        };
        let mut remaining = amount;
        let mut emptied = Vec::new();
        for stack in status.stacks.iter_mut().rev().filter(|s| !s.has_source()) {
            if remaining == 0 {
                break;
            }
            let taken = stack.value.min(remaining);
            stack.value -= taken;
            remaining -= taken;
            if stack.value == 0 {
                emptied.push(stack.id);
            }
        }
        let reduced = amount - remaining;
        if reduced == 0 {
            return 0;
        }
        for id in emptied {
            self.detach_stack(effect, id);
        }
        self.raise_effect_stack_changed(effect);
        self.refresh_status_effect(effect);
        reduced
    }

    /// Remove a status effect with all of its stacks
    pub fn remove_status_effect(&mut self, effect: &EffectType) -> bool {
        if !self.effects.contains(effect) {
            return false;
        }
        self.remove_status_effect_entry(effect);
        true
    }

    /// Whether `effect` is live and active
    pub fn has_status_effect(&self, effect: &EffectType) -> bool {
        self.effects.get(effect).is_some_and(StatusEffect::is_active)
    }

    pub fn active_stack_count(&self, effect: &EffectType) -> u32 {
        self.effects
            .get(effect)
            .map_or(0, StatusEffect::active_stack_count)
    }

    pub fn status_effect(&self, effect: &EffectType) -> Option<&StatusEffect> {
        self.effects.get(effect)
    }

    pub fn status_effects(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    /// Re-run the immunity hook for every live status effect
    pub fn refresh_immunity(&mut self) {
        for effect in self.effects.effect_types() {
            self.refresh_status_effect(&effect);
        }
    }

    pub fn is_immune(&self, effect: &EffectType) -> bool {
        match self.registry.immunity() {
            Some(hook) => hook(self, effect),
            None => false,
        }
    }

    /// Recompute the active count and settle everything that depends on it
    pub(crate) fn refresh_status_effect(&mut self, effect: &EffectType) {
        let Some(status) = self.effects.get(effect) else {
            return;
        };
        let instance = status.instance;
        let count = status.sum_active_values();
        let immune = self.is_immune(effect);
        let active = count > 0 && !immune;

        let Some(status) = self.effects.get_mut(effect) else {
            return;
        };
        let previous = status.active_stack_count;
        let flipped = status.is_active != active;
        status.active_stack_count = count;
        status.is_active = active;
        if previous != count || flipped {
            trace!("'{}' active count {} -> {}, active={}", effect, previous, count, active);
        }

        let def = self.registry.effect(effect).cloned();
        if flipped {
            debug!("status effect '{}' is now active={}", effect, active);
            let hook = def.as_ref().and_then(|d| {
                if active {
                    d.on_activate.clone()
                } else {
                    d.on_deactivate.clone()
                }
            });
            if let Some(hook) = hook {
                hook(self, effect);
            }
            self.raise_status_effect_changed(effect);
            // A nested refresh already settled the newer state
            if !self.is_settled(effect, instance, count, active) {
                return;
            }
        }

        if let Some(def) = def.as_ref() {
            if !def.modifiers.is_empty() && (flipped || (active && previous != count)) {
                self.sync_effect_modifiers(def, active, count);
                if !self.is_settled(effect, instance, count, active) {
                    return;
                }
            }
        }

        if count == 0 {
            self.drain_sourceless(effect);
            self.remove_if_empty(effect);
        }
    }

    fn is_settled(&self, effect: &EffectType, instance: u64, count: u32, active: bool) -> bool {
        self.effects.get(effect).is_some_and(|status| {
            status.instance == instance && status.active_stack_count == count && status.is_active == active
        })
    }

    /// Re-apply the definition's stat modifiers scaled by the active count
    fn sync_effect_modifiers(&mut self, def: &EffectDef, active: bool, count: u32) {
        let source = SourceId::for_effect(&def.id);
        self.remove_mods_by_source(&source);
        if !active {
            return;
        }
        for template in &def.modifiers {
            let mut modifier = self.modifier_pool.acquire();
            modifier.copy_from(template);
            modifier.value *= count as f32;
            self.insert_modifier(modifier, Some(source.clone()));
        }
    }

    fn drain_sourceless(&mut self, effect: &EffectType) {
        let ids = match self.effects.get(effect) {
            Some(status) => status.sourceless_stacks(),
            None => return,
        };
        if ids.is_empty() {
            return;
        }
        trace!("draining {} sourceless stacks of '{}'", ids.len(), effect);
        for id in ids {
            self.detach_stack(effect, id);
        }
        self.raise_effect_stack_changed(effect);
    }

    fn remove_if_empty(&mut self, effect: &EffectType) {
        if self.effects.get(effect).is_some_and(|status| status.stacks.is_empty()) {
            self.remove_status_effect_entry(effect);
        }
    }

    /// Remove the live instance, its subscriptions and its stat modifiers
    fn remove_status_effect_entry(&mut self, effect: &EffectType) {
        let Some(mut status) = self.effects.remove(effect) else {
            return;
        };
        let mut stacks = std::mem::take(&mut status.stacks);
        for stack in stacks.iter_mut() {
            self.unsubscribe(&ConditionOwner::Stack(effect.clone(), stack.id));
            stack.uninitialize();
        }
        self.stack_pool.release_list(stacks);

        for (index, condition) in status.custom_conditions.iter_mut().enumerate() {
            if let Some(condition) = condition.as_mut() {
                condition.unregister();
            }
            self.unsubscribe(&ConditionOwner::Custom {
                effect: effect.clone(),
                instance: status.instance,
                index,
            });
        }
        let was_active = status.is_active;
        self.effect_pool.release(status);
        self.remove_mods_by_source(&SourceId::for_effect(effect));
        debug!("removed status effect '{}'", effect);

        if was_active {
            let hook = self.registry.effect(effect).and_then(|d| d.on_deactivate.clone());
            if let Some(hook) = hook {
                hook(self, effect);
            }
            self.raise_status_effect_changed(effect);
        }
    }

    /// Take a stack out of its status effect and release it, without notifying
    fn detach_stack(&mut self, effect: &EffectType, id: StackId) -> bool {
        let Some(stack) = self.effects.get_mut(effect).and_then(|se| se.remove_stack(id)) else {
            return false;
        };
        self.unsubscribe(&ConditionOwner::Stack(effect.clone(), id));
        self.release_stack(stack);
        true
    }

    fn release_stack(&mut self, mut stack: EffectStack) {
        stack.uninitialize();
        self.stack_pool.release(stack);
    }

    /// A stack's duration changed: deactivate, and remove if self-managed
    pub(crate) fn on_stack_condition_changed(&mut self, effect: &EffectType, id: StackId) {
        let Some(stack) = self.effects.get_mut(effect).and_then(|se| se.stack_mut(id)) else {
            return;
        };
        if stack.refresh_active() {
            self.stack_activity_changed(effect, id);
        }
    }

    fn stack_activity_changed(&mut self, effect: &EffectType, id: StackId) {
        let Some(stack) = self.effects.get(effect).and_then(|se| se.stack(id)) else {
            return;
        };
        trace!("stack {:?} of '{}' is now active={}", id, effect, stack.is_active());
        if !stack.is_active() && !stack.has_source() {
            self.remove_stack(effect, id);
        } else {
            self.raise_effect_stack_changed(effect);
            self.refresh_status_effect(effect);
        }
    }

    /// A custom condition changed: run its action if the tree passes
    pub(crate) fn on_custom_condition_changed(&mut self, effect: &EffectType, instance: u64, index: usize) {
        let owner = ConditionOwner::Custom {
            effect: effect.clone(),
            instance,
            index,
        };
        let Some(condition) = self.take_condition(&owner) else {
            return;
        };
        let passed = condition.check_all(false);
        let reup = condition.reup_on_met;
        self.restore_condition(&owner, condition);

        if passed {
            let action = self
                .registry
                .effect(effect)
                .and_then(|d| d.custom_effects.get(index))
                .map(|c| c.action.clone());
            if let Some(action) = action {
                trace!("custom effect {} of '{}' triggered", index, effect);
                action(self, effect);
            }
        }
        if reup {
            if let Some(mut condition) = self.take_condition(&owner) {
                condition.reup(&*self);
                self.restore_condition(&owner, condition);
            }
        }
    }
}
