//! Per-scope service storage and invocation ledger.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::slot::ServiceSlot;

/// Services registered in one scope plus the order in which they were first
/// invoked. Always accessed under the owning scope's lock.
#[derive(Default)]
pub(crate) struct Registry {
    slots: BTreeMap<String, Arc<ServiceSlot>>,
    ledger: HashMap<String, u64>,
    next_index: u64,
}

impl Registry {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<ServiceSlot>> {
        self.slots.get(name).cloned()
    }

    /// Inserts or replaces; returns the previous slot.
    pub(crate) fn insert(&mut self, name: String, slot: ServiceSlot) -> Option<Arc<ServiceSlot>> {
        self.slots.insert(name, Arc::new(slot))
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Arc<ServiceSlot>> {
        self.slots.remove(name)
    }

    /// Names in sorted order.
    pub(crate) fn names(&self) -> impl Iterator<Item = &String> {
        self.slots.keys()
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (&String, &Arc<ServiceSlot>)> {
        self.slots.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Records the first invocation of `name`. Later calls keep the original
    /// index.
    pub(crate) fn mark_invoked(&mut self, name: &str) {
        if self.ledger.contains_key(name) {
            return;
        }
        let index = self.next_index;
        self.next_index += 1;
        self.ledger.insert(name.to_string(), index);
    }

    pub(crate) fn is_invoked(&self, name: &str) -> bool {
        self.ledger.contains_key(name)
    }

    pub(crate) fn forget_invocation(&mut self, name: &str) {
        self.ledger.remove(name);
    }

    /// Invoked names in first-invocation order.
    pub(crate) fn invoked(&self) -> Vec<String> {
        let mut entries: Vec<(&String, &u64)> = self.ledger.iter().collect();
        entries.sort_by_key(|(_, index)| **index);
        entries.into_iter().map(|(name, _)| name.clone()).collect()
    }
}
