// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The per-channel last-value-per-key cache (spec §4.2 "Value store contract").

use std::sync::Arc;

use dashmap::DashMap;

use crate::envelope::Envelope;

/// Per-channel `key -> LatestEnvelope<T>` store.
///
/// Backed by [`DashMap`], which already gives per-shard atomic replace
/// semantics on `insert`, satisfying the "readers observe a consistent
/// per-key value" requirement without an additional lock.
#[derive(Debug)]
pub struct ValueStore<T> {
    entries: DashMap<String, Arc<Envelope<T>>>,
}

impl<T> Default for ValueStore<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> ValueStore<T> {
    /// Creates a new, empty value store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `store[env.key] = env`. The caller is responsible for ensuring
    /// `env.key` is `Some` (spec invariant: store requires a non-empty key).
    pub fn update(&self, env: Envelope<T>) {
        if let Some(key) = env.key.clone() {
            self.entries.insert(key, Arc::new(env));
        }
    }

    /// Returns a point-in-time snapshot of every stored envelope.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Envelope<T>>> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Returns the envelope stored under `key`, if any.
    #[must_use]
    pub fn try_get(&self, key: &str) -> Option<Arc<Envelope<T>>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Removes and returns the envelope stored under `key`, if any.
    pub fn try_delete(&self, key: &str) -> Option<Arc<Envelope<T>>> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Removes every stored envelope.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
