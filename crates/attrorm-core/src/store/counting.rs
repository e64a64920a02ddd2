//! Call-counting store decorator.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{AttributeStore, Attributes, Item};
use crate::error::StoreResult;

/// Point-in-time copy of the store call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCallCounts {
    pub gets: u64,
    pub puts: u64,
    pub deletes: u64,
    pub queries: u64,
}

impl StoreCallCounts {
    /// Total number of round trips.
    pub fn total(&self) -> u64 {
        self.gets + self.puts + self.deletes + self.queries
    }
}

/// Round-trip counters.
#[derive(Debug, Default)]
pub struct StoreCounters {
    gets: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    queries: AtomicU64,
}

impl StoreCounters {
    /// Take a snapshot of the counters.
    pub fn snapshot(&self) -> StoreCallCounts {
        StoreCallCounts {
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.gets.store(0, Ordering::Relaxed);
        self.puts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.queries.store(0, Ordering::Relaxed);
    }
}

/// Wraps a store and counts every item-level round trip.
///
/// Domain lifecycle calls are forwarded uncounted.
pub struct CountingStore<S> {
    inner: S,
    counters: StoreCounters,
}

impl<S: AttributeStore> CountingStore<S> {
    /// Wrap a store.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            counters: StoreCounters::default(),
        }
    }

    /// Current call counts.
    pub fn counts(&self) -> StoreCallCounts {
        self.counters.snapshot()
    }

    /// Get the counters.
    pub fn counters(&self) -> &StoreCounters {
        &self.counters
    }

    /// Get the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: AttributeStore> AttributeStore for CountingStore<S> {
    fn create_domain(&self, domain: &str) -> StoreResult<()> {
        self.inner.create_domain(domain)
    }

    fn delete_domain(&self, domain: &str) -> StoreResult<()> {
        self.inner.delete_domain(domain)
    }

    fn list_domains(&self) -> StoreResult<Vec<String>> {
        self.inner.list_domains()
    }

    fn get(&self, domain: &str, key: &str) -> StoreResult<Option<Item>> {
        self.counters.gets.fetch_add(1, Ordering::Relaxed);
        self.inner.get(domain, key)
    }

    fn put(&self, domain: &str, key: &str, attributes: &Attributes) -> StoreResult<()> {
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
        self.inner.put(domain, key, attributes)
    }

    fn delete(&self, domain: &str, key: &str) -> StoreResult<()> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.inner.delete(domain, key)
    }

    fn query(&self, domain: &str, attribute: &str, value: &str) -> StoreResult<Vec<Item>> {
        self.counters.queries.fetch_add(1, Ordering::Relaxed);
        self.inner.query(domain, attribute, value)
    }

    fn flush(&self) -> StoreResult<()> {
        self.inner.flush()
    }
}
