//! Resource inventory shared by the state collectors and the reconciler.
//!
//! Both collectors write into the same inventory, keyed by resource identity.
//! The current-state collector fills `current`, the desired-state collector
//! fills `desired` and `config`. Entries are only created through one of the
//! two insert methods, so every stored entry has at least one side set.

use std::collections::btree_map::{self, BTreeMap};

/// Observed and desired payloads for a single resource identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState<P, C> {
    /// Payload read from the local store.
    pub current: Option<P>,
    /// Payload produced by the remote source.
    pub desired: Option<P>,
    /// Raw remote record backing `desired`. Never diffed.
    pub config: Option<C>,
}

impl<P, C> Default for ResourceState<P, C> {
    fn default() -> Self {
        Self {
            current: None,
            desired: None,
            config: None,
        }
    }
}

/// Map from resource identity to its state, built once per cycle.
#[derive(Debug, Clone)]
pub struct ResourceInventory<P, C> {
    state: BTreeMap<String, ResourceState<P, C>>,
}

impl<P, C> Default for ResourceInventory<P, C> {
    fn default() -> Self {
        Self {
            state: BTreeMap::new(),
        }
    }
}

impl<P, C> ResourceInventory<P, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the observed payload for `key`.
    pub fn insert_current(&mut self, key: impl Into<String>, current: P) {
        self.entry(key).current = Some(current);
    }

    /// Record the desired payload and its backing record for `key`.
    pub fn insert_desired(&mut self, key: impl Into<String>, desired: P, config: C) {
        let state = self.entry(key);
        state.desired = Some(desired);
        state.config = Some(config);
    }

    pub fn get(&self, key: &str) -> Option<&ResourceState<P, C>> {
        self.state.get(key)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ResourceState<P, C>> {
        self.state.iter()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    // Get-or-create; callers must set at least one side before returning.
    fn entry(&mut self, key: impl Into<String>) -> &mut ResourceState<P, C> {
        self.state.entry(key.into()).or_default()
    }
}

impl<'a, P, C> IntoIterator for &'a ResourceInventory<P, C> {
    type Item = (&'a String, &'a ResourceState<P, C>);
    type IntoIter = btree_map::Iter<'a, String, ResourceState<P, C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
