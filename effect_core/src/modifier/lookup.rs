//! ModifierLookup - per-stat modifier lists kept in operator order

use super::Modifier;
use crate::operator::OperatorTable;
use crate::types::{ModifierId, SourceId, StatType};
use std::collections::HashMap;

/// Modifiers grouped by stat type
///
/// Each list is sorted by operator order at insertion time; entries with the
/// same operator keep their insertion order.
#[derive(Debug, Default)]
pub struct ModifierLookup {
    lists: HashMap<StatType, Vec<Modifier>>,
}

impl ModifierLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a modifier after every entry with an order <= its own
    pub fn insert(&mut self, modifier: Modifier, operators: &OperatorTable) {
        let order = operators.order(&modifier.op);
        let list = self.lists.entry(modifier.stat_type.clone()).or_default();
        let index = list.partition_point(|m| operators.order(&m.op) <= order);
        list.insert(index, modifier);
    }

    /// Modifiers of one stat, in application order
    pub fn get(&self, stat: &StatType) -> &[Modifier] {
        self.lists.get(stat).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, stat: &StatType, id: ModifierId) -> Option<&Modifier> {
        self.get(stat).iter().find(|m| m.id == id)
    }

    pub fn find_mut(&mut self, stat: &StatType, id: ModifierId) -> Option<&mut Modifier> {
        self.lists.get_mut(stat)?.iter_mut().find(|m| m.id == id)
    }

    /// Locate a modifier by handle alone
    pub fn stat_of(&self, id: ModifierId) -> Option<&StatType> {
        self.lists
            .iter()
            .find(|(_, list)| list.iter().any(|m| m.id == id))
            .map(|(stat, _)| stat)
    }

    pub fn remove(&mut self, stat: &StatType, id: ModifierId) -> Option<Modifier> {
        let list = self.lists.get_mut(stat)?;
        let index = list.iter().position(|m| m.id == id)?;
        let removed = list.remove(index);
        if list.is_empty() {
            self.lists.remove(stat);
        }
        Some(removed)
    }

    /// Remove every modifier tagged with `source`
    pub fn remove_by_source(&mut self, source: &SourceId) -> Vec<Modifier> {
        let mut removed = Vec::new();
        for list in self.lists.values_mut() {
            let mut i = 0;
            while i < list.len() {
                if list[i].source() == Some(source) {
                    removed.push(list.remove(i));
                } else {
                    i += 1;
                }
            }
        }
        self.lists.retain(|_, list| !list.is_empty());
        removed
    }

    /// Modifiers passing a source filter; `None` matches every modifier
    pub fn filter_by_source<'a>(
        &'a self,
        source: Option<&'a SourceId>,
    ) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.iter()
            .filter(move |m| source.map_or(true, |s| m.source() == Some(s)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.lists.values().flat_map(|list| list.iter())
    }

    pub fn len(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}
