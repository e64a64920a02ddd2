//! Cache used when caching is disabled.

use super::{Cache, CacheStats, CacheStatsSnapshot};
use crate::store::Item;

/// Stores nothing; every lookup misses.
#[derive(Debug, Default)]
pub struct PassThroughCache {
    stats: CacheStats,
}

impl PassThroughCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for PassThroughCache {
    fn get(&self, _domain: &str, _key: &str) -> Option<Item> {
        self.stats.record_miss();
        None
    }

    fn generation(&self) -> u64 {
        0
    }

    fn put(&self, _domain: &str, _key: &str, _item: Item) {}

    fn put_if_unchanged(&self, _domain: &str, _key: &str, _item: Item, _generation: u64) -> bool {
        false
    }

    fn replace_if_unchanged(
        &self,
        _domain: &str,
        _key: &str,
        _item: Item,
        _generation: u64,
    ) -> bool {
        false
    }

    fn invalidate(&self, _domain: &str, _key: &str) {}

    fn clear(&self) {}

    fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Attributes;

    #[test]
    fn test_always_misses() {
        let cache = PassThroughCache::new();
        cache.put("Doc", "foo", Item::new("foo", Attributes::new()));

        assert!(cache.get("Doc", "foo").is_none());
        assert!(!cache.put_if_unchanged("Doc", "foo", Item::new("foo", Attributes::new()), 0));
        assert!(cache.get("Doc", "foo").is_none());
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }
}
