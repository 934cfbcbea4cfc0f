//! Serializable save state of a Stats

use super::{Stat, Stats, StatsError};
use crate::effect::StackDef;
use crate::modifier::{Modifier, ModifierDef};
use crate::registry::Registry;
use crate::types::{EffectType, SourceId, StatType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Configuration of every stat, modifier and stack of one entity
///
/// Runtime state (activity, cached condition results) is not stored; it is
/// recomputed when the snapshot is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub stats: BTreeMap<StatType, Stat>,
    #[serde(default)]
    pub modifiers: Vec<ModifierDef>,
    #[serde(default)]
    pub effects: Vec<StatusEffectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectSnapshot {
    pub effect: EffectType,
    pub stacks: Vec<StackDef>,
}

impl Stats {
    /// Capture the configuration needed to rebuild this entity
    ///
    /// Modifiers applied by status effects are left out; loading the
    /// effect's stacks re-applies them.
    pub fn snapshot(&self) -> StatsSnapshot {
        let stats = self
            .values
            .iter()
            .map(|(stat, value)| (stat.clone(), *value))
            .collect();

        let mut modifiers: Vec<ModifierDef> = self
            .modifiers
            .iter()
            .filter(|m| !m.source().is_some_and(SourceId::is_effect_source))
            .map(Modifier::to_def)
            .collect();
        modifiers.sort_by(|a, b| a.stat.cmp(&b.stat));

        let mut effects: Vec<StatusEffectSnapshot> = self
            .effects
            .iter()
            .map(|status| StatusEffectSnapshot {
                effect: status.effect_type().clone(),
                stacks: status.stacks().iter().map(|s| s.to_def()).collect(),
            })
            .collect();
        effects.sort_by(|a, b| a.effect.cmp(&b.effect));

        StatsSnapshot {
            stats,
            modifiers,
            effects,
        }
    }

    /// Rebuild an entity from a snapshot
    pub fn from_snapshot(registry: Arc<Registry>, snapshot: &StatsSnapshot) -> Result<Stats, StatsError> {
        let mut stats = Stats::new(registry.clone());
        for (stat, value) in &snapshot.stats {
            stats.values.insert(stat.clone(), *value);
        }
        for def in &snapshot.modifiers {
            let modifier = def.build(registry.conditions())?;
            stats.insert_modifier(modifier, def.source.clone());
        }
        for status in &snapshot.effects {
            for def in &status.stacks {
                let stack = def.build(registry.conditions())?;
                stats.add_stack(&status.effect, stack, def.source.clone())?;
            }
        }
        Ok(stats)
    }
}
