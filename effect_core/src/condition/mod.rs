//! Condition tree - composable boolean gates for modifiers, stacks and custom effects
//!
//! A condition is a node in a binary tree. Each node caches its own result
//! while registered, and `check_all` walks the tree as an if/else-if chain:
//! a node that passes continues down its `and` branch, a node that fails
//! diverts to its `or` branch.
//!
//! Host subscriptions (timer set, per-stat listeners) are recorded by the
//! owning `Stats`; the tree itself only reports what it needs through
//! [`Condition::subscriptions`].

mod registry;
mod resource;
mod timed;

pub use registry::{ConditionBuilder, ConditionRegistry, ConditionSpec, CustomCondition};
pub use resource::{CompareOp, ResourceCondition};
pub use timed::TimedCondition;

use crate::types::StatType;
use std::collections::BTreeSet;

/// Free-form parameters of a condition payload
pub type ConditionParams = serde_json::Map<String, serde_json::Value>;

/// Read access to stat values for condition evaluation
pub trait StatReader {
    /// The stat's current value (e.g. current mana)
    fn current_value(&self, stat: &StatType) -> f32;
    /// The stat's calculated value (base folded with modifiers, e.g. max mana)
    fn computed_value(&self, stat: &StatType) -> f32;
}

/// Events a registered tree needs to hear about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
    pub timer: bool,
    pub stats: BTreeSet<StatType>,
}

/// Payload of a condition node
#[derive(Debug)]
pub enum ConditionKind {
    Timed(TimedCondition),
    Resource(ResourceCondition),
    Custom(Box<dyn CustomCondition>),
}

impl Clone for ConditionKind {
    fn clone(&self) -> Self {
        match self {
            ConditionKind::Timed(t) => ConditionKind::Timed(t.clone()),
            ConditionKind::Resource(r) => ConditionKind::Resource(r.clone()),
            ConditionKind::Custom(c) => ConditionKind::Custom(c.box_clone()),
        }
    }
}

impl ConditionKind {
    /// Type tag used by the condition registry
    pub fn type_tag(&self) -> &str {
        match self {
            ConditionKind::Timed(_) => "timed",
            ConditionKind::Resource(_) => "resource",
            ConditionKind::Custom(c) => c.type_tag(),
        }
    }

    fn evaluate(&self, stats: &dyn StatReader) -> bool {
        match self {
            ConditionKind::Timed(t) => t.is_expired(),
            ConditionKind::Resource(r) => r.evaluate(stats),
            ConditionKind::Custom(c) => c.evaluate(stats),
        }
    }

    fn uses_timer(&self) -> bool {
        match self {
            ConditionKind::Timed(_) => true,
            ConditionKind::Resource(_) => false,
            ConditionKind::Custom(c) => c.uses_timer(),
        }
    }

    fn watched_stat(&self) -> Option<&StatType> {
        match self {
            ConditionKind::Timed(_) => None,
            ConditionKind::Resource(r) => Some(&r.stat),
            ConditionKind::Custom(c) => c.watched_stat(),
        }
    }

    fn tick(&mut self, delta: f32) {
        match self {
            ConditionKind::Timed(t) => t.tick(delta),
            ConditionKind::Resource(_) => {}
            ConditionKind::Custom(c) => c.tick(delta),
        }
    }

    fn reset(&mut self) {
        match self {
            ConditionKind::Timed(t) => t.reset(),
            ConditionKind::Resource(_) => {}
            ConditionKind::Custom(c) => c.reset(),
        }
    }

    /// Configuration fields of the payload
    pub fn params(&self) -> ConditionParams {
        let value = match self {
            ConditionKind::Timed(t) => serde_json::to_value(t),
            ConditionKind::Resource(r) => serde_json::to_value(r),
            ConditionKind::Custom(c) => return c.params(),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map,
            _ => ConditionParams::new(),
        }
    }
}

/// A node of a condition tree
#[derive(Debug)]
pub struct Condition {
    /// Invert this node's own result
    pub not: bool,
    /// Reset the payload after a custom effect has been triggered by it
    pub reup_on_met: bool,
    /// Treat this node as failed when the owner has a source
    pub ignore_with_source: bool,
    and: Option<Box<Condition>>,
    or: Option<Box<Condition>>,
    kind: ConditionKind,
    result: bool,
    registered: bool,
}

impl Clone for Condition {
    /// Deep copy of the whole tree, unregistered
    fn clone(&self) -> Self {
        Condition {
            not: self.not,
            reup_on_met: self.reup_on_met,
            ignore_with_source: self.ignore_with_source,
            and: self.and.clone(),
            or: self.or.clone(),
            kind: self.kind.clone(),
            result: false,
            registered: false,
        }
    }
}

impl Condition {
    pub fn new(kind: ConditionKind) -> Self {
        Condition {
            not: false,
            reup_on_met: false,
            ignore_with_source: false,
            and: None,
            or: None,
            kind,
            result: false,
            registered: false,
        }
    }

    /// A countdown that is met after `duration` seconds
    pub fn timed(duration: f32) -> Self {
        Self::new(ConditionKind::Timed(TimedCondition::new(duration)))
    }

    /// A threshold on a stat's current value
    pub fn resource(stat: impl Into<StatType>, compare: CompareOp, target: f32, is_percent: bool) -> Self {
        Self::new(ConditionKind::Resource(ResourceCondition::new(
            stat, compare, target, is_percent,
        )))
    }

    pub fn custom(payload: Box<dyn CustomCondition>) -> Self {
        Self::new(ConditionKind::Custom(payload))
    }

    pub fn negated(mut self) -> Self {
        self.not = true;
        self
    }

    pub fn with_reup_on_met(mut self) -> Self {
        self.reup_on_met = true;
        self
    }

    pub fn with_ignore_with_source(mut self) -> Self {
        self.ignore_with_source = true;
        self
    }

    pub fn with_and(mut self, next: Condition) -> Self {
        self.and = Some(Box::new(next));
        self
    }

    pub fn with_or(mut self, next: Condition) -> Self {
        self.or = Some(Box::new(next));
        self
    }

    pub fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    pub fn and(&self) -> Option<&Condition> {
        self.and.as_deref()
    }

    pub fn or(&self) -> Option<&Condition> {
        self.or.as_deref()
    }

    /// Cached result of this node; only meaningful while registered
    pub fn result(&self) -> bool {
        self.result
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The root payload as a timer, if it is one
    pub fn as_timed(&self) -> Option<&TimedCondition> {
        match &self.kind {
            ConditionKind::Timed(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_timed_mut(&mut self) -> Option<&mut TimedCondition> {
        match &mut self.kind {
            ConditionKind::Timed(t) => Some(t),
            _ => None,
        }
    }

    fn evaluate(&self, stats: &dyn StatReader) -> bool {
        self.kind.evaluate(stats) ^ self.not
    }

    /// Register this node and its children, computing their initial results
    ///
    /// Registering an already registered tree does nothing.
    pub fn register(&mut self, stats: &dyn StatReader) {
        if self.registered {
            return;
        }
        self.registered = true;
        self.result = self.evaluate(stats);
        if let Some(and) = self.and.as_mut() {
            and.register(stats);
        }
        if let Some(or) = self.or.as_mut() {
            or.register(stats);
        }
    }

    /// Unregister this node and its children; the tree stays intact
    pub fn unregister(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        if let Some(and) = self.and.as_mut() {
            and.unregister();
        }
        if let Some(or) = self.or.as_mut() {
            or.unregister();
        }
    }

    /// Walk the cached results as an if/else-if chain
    ///
    /// A passing node continues to its `and` child (true when absent); a
    /// failing node diverts to its `or` child (false when absent).
    pub fn check_all(&self, has_source: bool) -> bool {
        let passed = self.result && !(self.ignore_with_source && has_source);
        if passed {
            self.and.as_ref().map_or(true, |c| c.check_all(has_source))
        } else {
            self.or.as_ref().map_or(false, |c| c.check_all(has_source))
        }
    }

    /// Re-evaluate this node only; returns whether its result flipped
    pub fn recompute(&mut self, stats: &dyn StatReader) -> bool {
        if !self.registered {
            return false;
        }
        let result = self.evaluate(stats);
        let changed = result != self.result;
        self.result = result;
        changed
    }

    /// Advance every timer in the tree; returns whether any result flipped
    pub fn tick(&mut self, delta: f32, stats: &dyn StatReader) -> bool {
        if !self.registered {
            return false;
        }
        let mut changed = false;
        if self.kind.uses_timer() {
            self.kind.tick(delta);
            changed |= self.recompute(stats);
        }
        if let Some(and) = self.and.as_mut() {
            changed |= and.tick(delta, stats);
        }
        if let Some(or) = self.or.as_mut() {
            changed |= or.tick(delta, stats);
        }
        changed
    }

    /// Re-evaluate every node watching `stat`; returns whether any result flipped
    pub fn refresh_stat(&mut self, stat: &StatType, stats: &dyn StatReader) -> bool {
        if !self.registered {
            return false;
        }
        let mut changed = false;
        if self.kind.watched_stat() == Some(stat) {
            changed |= self.recompute(stats);
        }
        if let Some(and) = self.and.as_mut() {
            changed |= and.refresh_stat(stat, stats);
        }
        if let Some(or) = self.or.as_mut() {
            changed |= or.refresh_stat(stat, stats);
        }
        changed
    }

    /// Reset every payload in the tree to its configured start and recompute,
    /// without notifying anyone
    pub fn reup(&mut self, stats: &dyn StatReader) {
        self.kind.reset();
        if self.registered {
            self.result = self.evaluate(stats);
        }
        if let Some(and) = self.and.as_mut() {
            and.reup(stats);
        }
        if let Some(or) = self.or.as_mut() {
            or.reup(stats);
        }
    }

    /// Attach `other` at the end of this tree's `or` chain
    pub fn append_or(&mut self, other: Condition) {
        match self.or.as_mut() {
            Some(or) => or.append_or(other),
            None => self.or = Some(Box::new(other)),
        }
    }

    /// Collect the events this tree depends on
    pub fn subscriptions(&self) -> Subscriptions {
        let mut subs = Subscriptions::default();
        self.collect_subscriptions(&mut subs);
        subs
    }

    fn collect_subscriptions(&self, subs: &mut Subscriptions) {
        subs.timer |= self.kind.uses_timer();
        if let Some(stat) = self.kind.watched_stat() {
            subs.stats.insert(stat.clone());
        }
        if let Some(and) = self.and.as_ref() {
            and.collect_subscriptions(subs);
        }
        if let Some(or) = self.or.as_ref() {
            or.collect_subscriptions(subs);
        }
    }

    /// Serializable configuration of this tree
    pub fn to_spec(&self) -> ConditionSpec {
        ConditionSpec {
            type_tag: self.kind.type_tag().to_string(),
            not: self.not,
            reup_on_met: self.reup_on_met,
            ignore_with_source: self.ignore_with_source,
            and: self.and.as_ref().map(|c| Box::new(c.to_spec())),
            or: self.or.as_ref().map(|c| Box::new(c.to_spec())),
            params: self.kind.params(),
        }
    }
}
