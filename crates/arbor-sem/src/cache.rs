//! Bounded memo cache with insert-order eviction.

use std::hash::Hash;

use indexmap::IndexMap;
use tracing::trace;

/// "Least recently added" cache: when full, the entry that has been in the
/// cache longest is evicted, regardless of how recently it was read. Reads
/// never reorder entries, so lookups stay O(1) with no bookkeeping.
#[derive(Debug, Clone)]
pub struct LraCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: Option<usize>,
}

impl<K: Eq + Hash, V> LraCache<K, V> {
    /// `capacity: None` means unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        LraCache {
            entries: IndexMap::new(),
            capacity,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.entries.len() >= capacity {
                // shift_remove_index(0) drops the oldest insertion and keeps
                // the remaining order intact.
                self.entries.shift_remove_index(0);
                trace!(capacity, "cache full, evicted oldest entry");
            }
        }
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }
}
