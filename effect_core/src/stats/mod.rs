//! Stats - the aggregate root owning one entity's stats, modifiers and status effects

mod effects;
mod events;
mod modifiers;
mod snapshot;
mod stat;
mod subscriptions;

pub use events::{EffectListener, StatListener};
pub use snapshot::{StatsSnapshot, StatusEffectSnapshot};
pub use stat::Stat;

use crate::condition::StatReader;
use crate::config::ConfigError;
use crate::effect::{EffectLookup, EffectStack, StatusEffect};
use crate::modifier::{self, CalculateOptions, Modifier, ModifierLookup};
use crate::pool::Pool;
use crate::registry::Registry;
use crate::types::{ConditionOwner, EffectType, StatType};
use events::Events;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use subscriptions::TimerSet;
use thiserror::Error;

/// Runtime error from a `Stats` operation
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Effect type '{0}' is not registered")]
    UnknownEffect(EffectType),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Stats, modifiers and status effects of one entity
///
/// All mutation is synchronous. A condition change is fully propagated
/// (cache, owner, removal, notifications) before the call that caused it
/// returns.
pub struct Stats {
    registry: Arc<Registry>,
    values: HashMap<StatType, Stat>,
    modifiers: ModifierLookup,
    effects: EffectLookup,
    timers: TimerSet,
    stat_listeners: HashMap<StatType, Vec<ConditionOwner>>,
    events: Events,
    modifier_pool: Pool<Modifier>,
    stack_pool: Pool<EffectStack>,
    effect_pool: Pool<StatusEffect>,
    /// Stats whose modified hook is currently running
    modifying: HashSet<StatType>,
    next_handle: u64,
}

impl fmt::Debug for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stats")
            .field("values", &self.values)
            .field("modifiers", &self.modifiers)
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

impl Stats {
    pub fn new(registry: Arc<Registry>) -> Self {
        Stats {
            registry,
            values: HashMap::new(),
            modifiers: ModifierLookup::new(),
            effects: EffectLookup::new(),
            timers: TimerSet::default(),
            stat_listeners: HashMap::new(),
            events: Events::default(),
            modifier_pool: Pool::new(),
            stack_pool: Pool::new(),
            effect_pool: Pool::new(),
            modifying: HashSet::new(),
            next_handle: 1,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub(crate) fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Stored value of a stat, or the registered default
    pub fn stat(&self, stat: &StatType) -> Stat {
        self.values
            .get(stat)
            .copied()
            .unwrap_or_else(|| Stat::new(self.registry.stat_default(stat)))
    }

    pub fn set_stat_base(&mut self, stat: &StatType, value: f32) {
        let default = self.registry.stat_default(stat);
        self.values
            .entry(stat.clone())
            .or_insert_with(|| Stat::new(default))
            .base_value = value;
        self.stat_modified(stat);
    }

    pub fn set_stat_current(&mut self, stat: &StatType, value: f32) {
        let default = self.registry.stat_default(stat);
        self.values
            .entry(stat.clone())
            .or_insert_with(|| Stat::new(default))
            .current_value = value;
        self.stat_modified(stat);
    }

    /// Raise stat-changed, then run the stat's modified hook unless it is
    /// already running for this stat
    fn stat_modified(&mut self, stat: &StatType) {
        self.raise_stat_changed(stat);
        let Some(hook) = self.registry.modified_hook(stat).cloned() else {
            return;
        };
        if !self.modifying.insert(stat.clone()) {
            return;
        }
        hook(self, stat);
        self.modifying.remove(stat);
    }

    /// Calculated value of a stat from its base and active modifiers
    pub fn calculate(&self, stat: &StatType, ignore_hidden: bool) -> f32 {
        self.calculate_with(
            stat,
            CalculateOptions {
                ignore_hidden,
                ..Default::default()
            },
        )
    }

    /// Calculate through the stat's override hook if one is registered
    pub fn calculate_with(&self, stat: &StatType, options: CalculateOptions) -> f32 {
        match self.registry.calculate_override(stat) {
            Some(hook) => hook(self, stat, options),
            None => self.default_calculate(stat, options),
        }
    }

    /// The built-in ordered fold, ignoring any override hook
    pub fn default_calculate(&self, stat: &StatType, options: CalculateOptions) -> f32 {
        modifier::calculate(
            self.stat(stat).base_value,
            self.modifiers.get(stat),
            self.registry.operators(),
            options,
        )
    }
}

impl StatReader for Stats {
    fn current_value(&self, stat: &StatType) -> f32 {
        self.stat(stat).current_value
    }

    fn computed_value(&self, stat: &StatType) -> f32 {
        self.calculate(stat, false)
    }
}
