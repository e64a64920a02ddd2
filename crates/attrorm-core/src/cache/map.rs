//! Map-backed cache.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use super::{Cache, CacheKey, CacheStats, CacheStatsSnapshot};
use crate::store::Item;

/// Cache backed by a single mutex-guarded map.
///
/// Safe for concurrent use by any number of sessions. The contents are open
/// to inspection so tests can assert on exactly what is cached.
#[derive(Debug, Default)]
pub struct MapCache {
    state: Mutex<MapState>,
    stats: CacheStats,
}

#[derive(Debug, Default)]
struct MapState {
    entries: HashMap<CacheKey, Item>,
    generation: u64,
}

impl MapState {
    fn advance(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl MapCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all entries, ordered by domain then key.
    pub fn snapshot(&self) -> BTreeMap<CacheKey, Item> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Cached keys, ordered by domain then key.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.state.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Check whether a row is cached, without touching the statistics.
    pub fn contains(&self, domain: &str, key: &str) -> bool {
        self.state
            .lock()
            .entries
            .contains_key(&CacheKey::new(domain, key))
    }

    /// Read an entry without touching the statistics.
    pub fn peek(&self, domain: &str, key: &str) -> Option<Item> {
        self.state
            .lock()
            .entries
            .get(&CacheKey::new(domain, key))
            .cloned()
    }

    /// Get the current number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MapCache {
    fn get(&self, domain: &str, key: &str) -> Option<Item> {
        let found = self
            .state
            .lock()
            .entries
            .get(&CacheKey::new(domain, key))
            .cloned();
        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    fn put(&self, domain: &str, key: &str, item: Item) {
        let mut state = self.state.lock();
        state.entries.insert(CacheKey::new(domain, key), item);
        state.advance();
    }

    fn put_if_unchanged(&self, domain: &str, key: &str, item: Item, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.entries.insert(CacheKey::new(domain, key), item);
        true
    }

    fn replace_if_unchanged(
        &self,
        domain: &str,
        key: &str,
        item: Item,
        generation: u64,
    ) -> bool {
        let mut state = self.state.lock();
        let unchanged = state.generation == generation;
        let cache_key = CacheKey::new(domain, key);
        if unchanged {
            state.entries.insert(cache_key, item);
        } else if state.entries.remove(&cache_key).is_some() {
            self.stats.record_invalidation();
        }
        state.advance();
        unchanged
    }

    fn invalidate(&self, domain: &str, key: &str) {
        let mut state = self.state.lock();
        if state.entries.remove(&CacheKey::new(domain, key)).is_some() {
            self.stats.record_invalidation();
        }
        state.advance();
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.advance();
    }

    fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    fn name(&self) -> &'static str {
        "map"
    }
}
