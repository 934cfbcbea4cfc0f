//! Property tests for calculation order and stack counting

use effect_core::prelude::*;
use proptest::prelude::*;

fn op_strategy() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::BaseAdd),
        Just(Operator::Add),
        Just(Operator::PercentAdd),
        Just(Operator::PercentMult),
        Just(Operator::Max),
        Just(Operator::Min),
    ]
}

fn modifier_strategy() -> impl Strategy<Value = (Operator, i32)> {
    (op_strategy(), -20i32..20)
}

fn value_for(op: &Operator, raw: i32) -> f32 {
    match op {
        Operator::PercentAdd | Operator::PercentMult => raw as f32 / 20.0,
        _ => raw as f32,
    }
}

fn stats() -> Stats {
    let mut registry = Registry::new();
    registry.register_stat("health", 100.0).unwrap();
    registry
        .register_effect(
            EffectDef::new("poison")
                .with_stack_mode(StackMode::Multi)
                .with_max_stack(5),
        )
        .unwrap();
    Stats::new(registry.into_shared())
}

#[derive(Debug, Clone)]
enum StackAction {
    Add(u32),
    AddSourced(u32),
    Reduce(u32),
    RemoveSourced,
}

fn stack_action_strategy() -> impl Strategy<Value = StackAction> {
    prop_oneof![
        (0u32..4).prop_map(StackAction::Add),
        (1u32..3).prop_map(StackAction::AddSourced),
        (0u32..8).prop_map(StackAction::Reduce),
        Just(StackAction::RemoveSourced),
    ]
}

proptest! {
    #[test]
    fn calculate_is_independent_of_insertion_order(
        mods in prop::collection::vec(modifier_strategy(), 0..12)
    ) {
        let health = StatType::from("health");
        let mut shuffled = stats();
        for (op, raw) in &mods {
            shuffled.add_mod(Modifier::new("health", op.clone(), value_for(op, *raw)), None);
        }

        let table = shuffled.registry().operators().clone();
        let mut sorted_mods = mods.clone();
        sorted_mods.sort_by_key(|(op, _)| table.order(op));
        let mut sorted = stats();
        for (op, raw) in &sorted_mods {
            sorted.add_mod(Modifier::new("health", op.clone(), value_for(op, *raw)), None);
        }

        let orders: Vec<i32> = shuffled
            .modifiers(&health)
            .iter()
            .map(|m| table.order(&m.op))
            .collect();
        prop_assert!(orders.windows(2).all(|w| w[0] <= w[1]));

        let ops: Vec<Operator> = shuffled.modifiers(&health).iter().map(|m| m.op.clone()).collect();
        let sorted_ops: Vec<Operator> = sorted.modifiers(&health).iter().map(|m| m.op.clone()).collect();
        prop_assert_eq!(ops, sorted_ops);

        let a = shuffled.calculate(&health, false);
        let b = sorted.calculate(&health, false);
        prop_assert!((a - b).abs() <= 1e-3 * a.abs().max(1.0), "{} != {}", a, b);
    }

    #[test]
    fn active_count_matches_stacks_and_cap(
        actions in prop::collection::vec(stack_action_strategy(), 0..30)
    ) {
        let poison = EffectType::from("poison");
        let totem = SourceId::from("totem");
        let mut stats = stats();

        for action in actions {
            let before = stats.active_stack_count(&poison);
            match action {
                StackAction::Add(value) => {
                    stats.add_stack(&poison, EffectStack::new(value), None).unwrap();
                }
                StackAction::AddSourced(value) => {
                    stats.add_stack(&poison, EffectStack::new(value), Some(totem.clone())).unwrap();
                }
                StackAction::Reduce(amount) => {
                    let reduced = stats.reduce_stacks(&poison, amount);
                    prop_assert!(reduced <= amount);
                    prop_assert!(reduced <= before);
                }
                StackAction::RemoveSourced => {
                    stats.remove_stacks_by_source(&poison, &totem);
                }
            }

            let count = stats.active_stack_count(&poison);
            match stats.status_effect(&poison) {
                Some(status) => {
                    let total: u32 = status.stacks().iter().map(|s| s.value).sum();
                    prop_assert_eq!(count, total);
                    let sourceless: u32 = status
                        .stacks()
                        .iter()
                        .filter(|s| s.source().is_none())
                        .map(|s| s.value)
                        .sum();
                    prop_assert!(sourceless <= 5);
                    prop_assert_eq!(stats.has_status_effect(&poison), count > 0);
                }
                None => {
                    prop_assert_eq!(count, 0);
                }
            }
        }
    }
}
