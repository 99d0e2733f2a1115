//! In-memory set of confirmed proxy keys, seeded from the durable store

use crate::error::HarvestError;
use crate::proxy::store::ProxyStore;
use std::collections::HashSet;

/// Confirmed-state truth for the running process
///
/// Keys only ever enter after their store append succeeded, and never leave.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    keys: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from everything the store has recorded
    pub fn load_from<S: ProxyStore + ?Sized>(store: &mut S) -> Result<Self, HarvestError> {
        let keys = store.load()?.into_iter().collect();
        Ok(Self { keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Record a key whose durable append already completed
    pub fn insert(&mut self, key: String) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
