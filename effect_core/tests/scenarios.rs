//! End-to-end behaviour of a Stats driven through its public API

use effect_core::condition::{CompareOp, Condition, ConditionKind, ConditionRegistry, StatReader};
use effect_core::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn stat(name: &str) -> StatType {
    StatType::from(name)
}

fn effect(name: &str) -> EffectType {
    EffectType::from(name)
}

fn base_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_stat("health", 100.0).unwrap();
    registry.register_stat("mana", 100.0).unwrap();
    registry
}

#[test]
fn test_flat_modifier_lowers_health() {
    let mut stats = Stats::new(base_registry().into_shared());
    let outcome = stats.add_mod(Modifier::new("health", Operator::Add, -30.0), None);
    assert!(matches!(outcome, AddOutcome::Modifier(_)));
    assert_eq!(stats.calculate(&stat("health"), false), 70.0);
}

#[test]
fn test_multi_stacks_respect_cap() {
    let mut registry = base_registry();
    registry
        .register_effect(
            EffectDef::new("poison")
                .with_stack_mode(StackMode::Multi)
                .with_max_stack(3),
        )
        .unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let poison = effect("poison");

    for _ in 0..3 {
        let outcome = stats.add_stack(&poison, EffectStack::new(1), None).unwrap();
        assert!(matches!(outcome, AddOutcome::Stack(_)));
    }
    assert_eq!(stats.active_stack_count(&poison), 3);

    let fourth = stats.add_stack(&poison, EffectStack::new(1), None).unwrap();
    assert_eq!(fourth, AddOutcome::Discarded);
    assert_eq!(stats.active_stack_count(&poison), 3);
    assert_eq!(stats.status_effect(&poison).unwrap().stack_count(), 3);
}

#[test]
fn test_timed_modifier_expires_and_is_removed() {
    let mut stats = Stats::new(base_registry().into_shared());
    let health = stat("health");
    stats.add_mod(
        Modifier::new("health", Operator::Add, 50.0).with_duration(Condition::timed(5.0)),
        None,
    );
    assert_eq!(stats.calculate(&health, false), 150.0);

    stats.process(5.0);
    assert_eq!(stats.calculate(&health, false), 100.0);
    assert!(stats.modifiers(&health).is_empty());
    assert_eq!(stats.timer_count(), 0);
}

#[test]
fn test_percent_resource_condition_fires_once() {
    static FIRED: AtomicU32 = AtomicU32::new(0);
    let mut registry = base_registry();
    registry
        .register_effect(EffectDef::new("mana_shield").with_custom_effect(
            Condition::resource("mana", CompareOp::LessEquals, 20.0, true),
            Arc::new(|_: &mut Stats, _: &EffectType| {
                FIRED.fetch_add(1, Ordering::SeqCst);
            }),
        ))
        .unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let mana = stat("mana");
    let shield = effect("mana_shield");
    stats.add_stack(&shield, EffectStack::new(1), None).unwrap();

    let condition = stats.status_effect(&shield).unwrap().custom_condition(0).unwrap();
    let ConditionKind::Resource(resource) = condition.kind() else {
        panic!("expected a resource condition");
    };
    assert_eq!(resource.effective_target(&stats), 20.0);
    assert!(!condition.result());

    stats.set_stat_current(&mana, 20.0);
    assert!(stats.status_effect(&shield).unwrap().custom_condition(0).unwrap().result());
    assert_eq!(FIRED.load(Ordering::SeqCst), 1);

    // Still met: no further change, no further callback
    stats.set_stat_current(&mana, 15.0);
    assert_eq!(FIRED.load(Ordering::SeqCst), 1);
}

#[test]
fn test_percent_resource_condition_follows_computed_max() {
    let mut stats = Stats::new(base_registry().into_shared());
    let health = stat("health");
    let mana = stat("mana");
    stats.set_stat_current(&mana, 30.0);

    let gate = Condition::resource("mana", CompareOp::LessEquals, 20.0, true);
    let outcome = stats.add_mod(
        Modifier::new("health", Operator::Add, 50.0).with_duration(gate),
        Some(SourceId::from("blood_pact")),
    );
    let AddOutcome::Modifier(id) = outcome else {
        panic!("expected a modifier");
    };
    assert!(stats.modifier(id).unwrap().is_active());
    assert_eq!(stats.calculate(&health, false), 150.0);

    // Raising max mana to 200 moves the threshold to 40, which 30 now meets
    stats.add_mod(Modifier::new("mana", Operator::Add, 100.0), None);
    assert!(!stats.modifier(id).unwrap().is_active());
    assert_eq!(stats.calculate(&health, false), 100.0);
    assert_eq!(stats.modifiers(&health).len(), 1);
}

#[test]
fn test_extend_adds_time_to_existing_stack() {
    let mut registry = base_registry();
    registry
        .register_effect(EffectDef::new("haste").with_stack_mode(StackMode::Extend))
        .unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let haste = effect("haste");

    let first = stats
        .add_stack(&haste, EffectStack::new(1).with_duration(Condition::timed(4.0)), None)
        .unwrap();
    let second = stats
        .add_stack(&haste, EffectStack::new(1).with_duration(Condition::timed(6.0)), None)
        .unwrap();
    let AddOutcome::Stack(id) = first else {
        panic!("expected a new stack");
    };
    assert_eq!(second, AddOutcome::Merged(id));

    let status = stats.status_effect(&haste).unwrap();
    assert_eq!(status.stack_count(), 1);
    let timer = status.stacks()[0].duration.as_ref().unwrap().as_timed().unwrap();
    assert_eq!(timer.time_left, 10.0);
}

#[test]
fn test_repeated_removal_changes_nothing() {
    let mut registry = base_registry();
    registry.register_effect(EffectDef::new("poison")).unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let poison = effect("poison");

    let stack_events = Rc::new(Cell::new(0));
    let effect_events = Rc::new(Cell::new(0));
    let (stacks_seen, effects_seen) = (stack_events.clone(), effect_events.clone());
    stats.on_effect_stack_changed(move |_, _| stacks_seen.set(stacks_seen.get() + 1));
    stats.on_status_effect_changed(move |_, _| effects_seen.set(effects_seen.get() + 1));

    let AddOutcome::Stack(id) = stats.add_stack(&poison, EffectStack::new(2), None).unwrap() else {
        panic!("expected a new stack");
    };
    assert!(stats.remove_stack(&poison, id));
    let (stacks_after, effects_after) = (stack_events.get(), effect_events.get());

    assert!(!stats.remove_stack(&poison, id));
    assert!(!stats.remove_status_effect(&poison));
    assert_eq!(stats.reduce_stacks(&poison, 3), 0);
    assert_eq!(stack_events.get(), stacks_after);
    assert_eq!(effect_events.get(), effects_after);
    assert_eq!(stats.active_stack_count(&poison), 0);

    let mut condition = Condition::timed(1.0);
    condition.register(&stats);
    condition.unregister();
    condition.unregister();
    assert!(!condition.is_registered());
}

#[test]
fn test_process_ticks_each_timer_once() {
    let mut registry = base_registry();
    registry
        .register_effect(
            EffectDef::new("frenzy")
                .with_duration(Condition::timed(1.0))
                .on_deactivate(Arc::new(|stats: &mut Stats, _: &EffectType| {
                    stats.add_mod(
                        Modifier::new("health", Operator::Add, -10.0)
                            .with_duration(Condition::timed(1.0)),
                        None,
                    );
                })),
        )
        .unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let health = stat("health");

    stats.add_mod(
        Modifier::new("health", Operator::Add, 1.0).with_duration(Condition::timed(1.0)),
        None,
    );
    stats.add_mod(
        Modifier::new("health", Operator::Add, 2.0).with_duration(Condition::timed(1.0)),
        None,
    );
    stats.add_mod(
        Modifier::new("health", Operator::Add, 3.0).with_duration(Condition::timed(3.0)),
        None,
    );
    stats
        .add_stack(&effect("frenzy"), EffectStack::new(1), None)
        .unwrap();
    assert_eq!(stats.timer_count(), 4);

    stats.process(1.0);

    // Two modifiers and the frenzy stack expired; the deactivate hook added
    // a fresh timer that must not have been ticked yet
    assert!(stats.status_effect(&effect("frenzy")).is_none());
    let remaining: Vec<f32> = stats
        .modifiers(&health)
        .iter()
        .filter_map(|m| m.duration.as_ref().and_then(Condition::as_timed))
        .map(|t| t.time_left)
        .collect();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&2.0));
    assert!(remaining.contains(&1.0));
    assert_eq!(stats.timer_count(), 2);
    assert_eq!(stats.calculate(&health, false), 93.0);

    stats.process(1.0);
    assert_eq!(stats.calculate(&health, false), 103.0);
    assert_eq!(stats.timer_count(), 1);
}

#[test]
fn test_custom_effect_repeats_with_reup() {
    let mut registry = base_registry();
    registry
        .register_effect(EffectDef::new("burn").with_duration(Condition::timed(3.5)).with_custom_effect(
            Condition::timed(1.0).with_reup_on_met(),
            Arc::new(|stats: &mut Stats, _: &EffectType| {
                let health = StatType::from("health");
                let current = stats.stat(&health).current_value;
                stats.set_stat_current(&health, current - 5.0);
            }),
        ))
        .unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let health = stat("health");
    let burn = effect("burn");

    stats.add_stack(&burn, EffectStack::new(1), None).unwrap();
    for _ in 0..3 {
        stats.process(1.0);
    }
    assert_eq!(stats.stat(&health).current_value, 85.0);
    let timer = stats
        .status_effect(&burn)
        .unwrap()
        .custom_condition(0)
        .unwrap()
        .as_timed()
        .unwrap();
    assert_eq!(timer.time_left, 1.0);

    // The fourth tick fires once more before the burn itself runs out
    stats.process(1.0);
    stats.process(1.0);
    assert_eq!(stats.stat(&health).current_value, 80.0);
    assert!(stats.status_effect(&burn).is_none());
    assert_eq!(stats.timer_count(), 0);
}

#[test]
fn test_immunity_suppresses_without_removing() {
    let mut registry = base_registry();
    registry
        .register_effect(
            EffectDef::new("poison").with_modifier(Modifier::new("health_regen", Operator::Add, -1.0)),
        )
        .unwrap();
    registry.set_immunity(Arc::new(|stats: &Stats, effect: &EffectType| {
        effect.0 == "poison" && stats.stat(&StatType::from("antidote")).current_value > 0.0
    }));
    let mut stats = Stats::new(registry.into_shared());
    let poison = effect("poison");
    let regen = stat("health_regen");

    stats.add_stack(&poison, EffectStack::new(2), None).unwrap();
    assert!(stats.has_status_effect(&poison));
    assert_eq!(stats.calculate(&regen, false), -2.0);

    stats.set_stat_current(&stat("antidote"), 1.0);
    stats.refresh_immunity();
    assert!(!stats.has_status_effect(&poison));
    assert_eq!(stats.active_stack_count(&poison), 2);
    assert_eq!(stats.calculate(&regen, false), 0.0);

    stats.set_stat_current(&stat("antidote"), 0.0);
    stats.refresh_immunity();
    assert!(stats.has_status_effect(&poison));
    assert_eq!(stats.calculate(&regen, false), -2.0);
}

#[test]
fn test_cloned_condition_matches_original() {
    let mut stats = Stats::new(base_registry().into_shared());
    stats.set_stat_current(&stat("mana"), 30.0);

    let mut original = Condition::resource("mana", CompareOp::Greater, 50.0, false)
        .with_or(Condition::timed(2.0).negated())
        .with_and(Condition::resource("health", CompareOp::GreaterEquals, 50.0, true));
    let mut copy = original.clone();
    let mut rebuilt = ConditionRegistry::new().clone_condition(&original).unwrap();

    original.register(&stats);
    copy.register(&stats);
    rebuilt.register(&stats);

    for has_source in [false, true] {
        assert_eq!(copy.check_all(has_source), original.check_all(has_source));
        assert_eq!(rebuilt.check_all(has_source), original.check_all(has_source));
    }
    assert_eq!(copy.to_spec(), original.to_spec());
    assert!(stats.current_value(&stat("mana")) < 50.0);
}

#[test]
fn test_replace_stack_swaps_source() {
    let mut registry = base_registry();
    registry
        .register_effect(EffectDef::new("aura").with_stack_mode(StackMode::Multi))
        .unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let aura = effect("aura");
    let totem = SourceId::from("totem");

    stats.add_stack(&aura, EffectStack::new(2), Some(totem.clone())).unwrap();
    stats.add_stack(&aura, EffectStack::new(1), None).unwrap();
    stats
        .replace_stack(&aura, EffectStack::new(4), Some(totem.clone()))
        .unwrap();

    let status = stats.status_effect(&aura).unwrap();
    assert_eq!(status.stack_count(), 2);
    assert_eq!(status.active_stack_count(), 5);
    assert!(stats
        .replace_stack(&effect("unknown"), EffectStack::new(1), Some(totem))
        .is_err());
}

#[test]
fn test_pooled_objects_are_reused_cleared() {
    let mut registry = base_registry();
    registry.register_effect(EffectDef::new("poison")).unwrap();
    let mut stats = Stats::new(registry.into_shared());
    let poison = effect("poison");

    let mut stack = stats.acquire_stack();
    stack.value = 3;
    stack.duration = Some(Condition::timed(1.0));
    stats.add_stack(&poison, stack, Some(SourceId::from("trap"))).unwrap();
    stats.remove_stacks_by_source(&poison, &SourceId::from("trap"));

    let reused = stats.acquire_stack();
    assert_eq!(reused.value, 0);
    assert!(reused.duration.is_none());
    assert!(reused.source().is_none());
}
