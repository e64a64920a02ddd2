//! Attribute store layer.
//!
//! The store is the only component that performs I/O. Everything above it
//! talks to the [`AttributeStore`] trait; [`SledStore`] is the shipped backend.

mod config;
mod counting;
mod engine;
mod item;
mod record;

pub use config::StoreConfig;
pub use counting::{CountingStore, StoreCallCounts, StoreCounters};
pub use engine::SledStore;
pub use item::{Attributes, Item};

use crate::error::StoreResult;

/// A schema-less key/attribute store partitioned into domains.
///
/// Implementations do no caching. Every call is one blocking round trip.
pub trait AttributeStore: Send + Sync {
    /// Create a domain. Creating an existing domain is a no-op.
    fn create_domain(&self, domain: &str) -> StoreResult<()>;

    /// Delete a domain and all of its rows. Deleting an absent domain is a no-op.
    fn delete_domain(&self, domain: &str) -> StoreResult<()>;

    /// List created domains.
    fn list_domains(&self) -> StoreResult<Vec<String>>;

    /// Get a row by key.
    fn get(&self, domain: &str, key: &str) -> StoreResult<Option<Item>>;

    /// Insert or update a row, replacing all of its attributes.
    fn put(&self, domain: &str, key: &str, attributes: &Attributes) -> StoreResult<()>;

    /// Delete a row. Deleting an absent row is a no-op.
    fn delete(&self, domain: &str, key: &str) -> StoreResult<()>;

    /// All rows whose `attribute` equals `value`, in the order they were
    /// first written.
    fn query(&self, domain: &str, attribute: &str, value: &str) -> StoreResult<Vec<Item>>;

    /// Flush pending writes to durable storage.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
