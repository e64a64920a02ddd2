//! Entity cache shared by all sessions of a factory.
//!
//! Entries map `(domain, key)` to the last row snapshot written or read
//! through the cache. Sessions invalidate and repopulate entries before a
//! write returns, so any session sharing the cache reads its peers' writes.

mod map;
mod passthrough;
mod provider;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use map::MapCache;
pub use passthrough::PassThroughCache;
pub use provider::{CacheKind, CacheProvider};

use crate::store::Item;

/// Durable identity of a cached row.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub domain: String,
    pub key: String,
}

impl CacheKey {
    /// Create a cache key.
    pub fn new(domain: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.key)
    }
}

/// Key to row-snapshot cache.
///
/// After `invalidate(d, k)` the next `get(d, k)` misses. After `put(d, k, v)`
/// the next `get(d, k)` returns `v` unless an invalidate or clear intervened.
///
/// Every unconditional change (`put`, `invalidate`, `clear`) advances a
/// generation counter. A reader that captured the generation before going to
/// the store fills with [`Cache::put_if_unchanged`], which refuses once any
/// change has landed in between, so a slow read can never write a deleted or
/// superseded row back.
pub trait Cache: Send + Sync {
    /// Look up a row snapshot.
    fn get(&self, domain: &str, key: &str) -> Option<Item>;

    /// Current generation.
    fn generation(&self) -> u64;

    /// Store a row snapshot, overwriting any previous one.
    fn put(&self, domain: &str, key: &str, item: Item);

    /// Fill an entry read from the store, unless the cache changed since
    /// `generation`. Does not advance the generation. Returns whether the
    /// entry was stored.
    fn put_if_unchanged(&self, domain: &str, key: &str, item: Item, generation: u64) -> bool;

    /// Store a freshly written row if the cache is still at `generation`,
    /// otherwise drop the entry. Advances the generation either way.
    /// Returns whether the entry was stored.
    fn replace_if_unchanged(&self, domain: &str, key: &str, item: Item, generation: u64)
        -> bool;

    /// Remove a row snapshot.
    fn invalidate(&self, domain: &str, key: &str);

    /// Remove every entry.
    fn clear(&self);

    /// Hit/miss counters.
    fn stats(&self) -> CacheStatsSnapshot;

    /// Implementation name, for logging.
    fn name(&self) -> &'static str;
}

/// Cache statistics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of the counters.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

impl CacheStatsSnapshot {
    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits as f64;
        let total = hits + self.misses as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}
