//! attrorm core - sessions, lazy collections and a shared entity cache over a
//! schema-less attribute store.
//!
//! A [`SessionFactory`] owns the store and one cache instance. Each
//! [`Session`] is a short unit of work that finds, persists and removes
//! [`Entity`] values; one-to-many relationships come back as [`LazyList`]s
//! that query their children on first access.

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod factory;
pub mod lazy;
pub mod session;
pub mod store;

pub use cache::{Cache, CacheKey, CacheKind, CacheProvider, CacheStatsSnapshot, MapCache, PassThroughCache};
pub use config::{FactoryConfig, Properties};
pub use entity::{DomainNaming, Entity, Relations};
pub use error::{ConfigError, Error, MappingError, Result, StoreError};
pub use factory::{SessionFactory, SessionFactoryBuilder};
pub use lazy::LazyList;
pub use session::Session;
pub use store::{
    AttributeStore, Attributes, CountingStore, Item, SledStore, StoreCallCounts, StoreConfig,
};
