//! Entity sessions: the unit of work over the store and the shared cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::cache::Cache;
use crate::entity::{DomainNaming, Entity, Relations};
use crate::error::{Error, Result};
use crate::store::{AttributeStore, Item};

/// Factory-wide state every session reads.
#[derive(Debug)]
pub(crate) struct SessionShared {
    pub(crate) naming: DomainNaming,
    pub(crate) registered: BTreeSet<&'static str>,
    pub(crate) print_queries: bool,
}

impl SessionShared {
    /// Store domain of a registered entity type.
    pub(crate) fn domain_of<E: Entity>(&self) -> Result<String> {
        if !self.registered.contains(E::DOMAIN) {
            return Err(Error::UnregisteredEntity(E::DOMAIN));
        }
        Ok(self.naming.domain_of::<E>())
    }
}

/// A short-lived unit of work.
///
/// Reads go through the shared cache first; a miss fills the cache only if
/// no write touched the cache while the store was being read. Writes go to
/// the store and then refresh the cache entry before returning, so sessions
/// created later from the same factory see them. Sessions are meant for one caller at a time;
/// open one per unit of work and close it when done.
pub struct Session {
    id: u64,
    store: Option<Arc<dyn AttributeStore>>,
    cache: Arc<dyn Cache>,
    shared: Arc<SessionShared>,
}

impl Session {
    pub(crate) fn new(
        id: u64,
        store: Arc<dyn AttributeStore>,
        cache: Arc<dyn Cache>,
        shared: Arc<SessionShared>,
    ) -> Self {
        tracing::debug!(session = id, cache = cache.name(), "session opened");
        Self {
            id,
            store: Some(store),
            cache,
            shared,
        }
    }

    /// Session identifier, unique within its factory.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Check whether the session can still be used.
    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    /// Find an entity by key.
    ///
    /// Checks the cache first; on a miss reads the store and caches the row.
    /// Returns `Ok(None)` when the row does not exist.
    pub fn find<E: Entity>(&self, key: &str) -> Result<Option<E>> {
        let store = self.open_store()?;
        let domain = self.domain_of::<E>()?;

        if let Some(item) = self.cache.get(&domain, key) {
            tracing::debug!(session = self.id, %domain, key, "cache hit");
            return self.relations(store).hydrate::<E>(&domain, &item).map(Some);
        }

        tracing::debug!(session = self.id, %domain, key, "cache miss");
        let generation = self.cache.generation();
        let Some(item) = self.load(store, &domain, key)? else {
            return Ok(None);
        };

        let entity = self.relations(store).hydrate::<E>(&domain, &item)?;
        if !self.cache.put_if_unchanged(&domain, key, item, generation) {
            tracing::debug!(
                session = self.id,
                %domain,
                key,
                "cache changed during load, not filling"
            );
        }
        Ok(Some(entity))
    }

    /// Re-read an entity from the store, bypassing the cache.
    ///
    /// The cache entry is replaced by the fresh row, or dropped when the row
    /// no longer exists or another write landed during the read. A failed
    /// read leaves the cache untouched.
    pub fn refresh<E: Entity>(&self, key: &str) -> Result<Option<E>> {
        let store = self.open_store()?;
        let domain = self.domain_of::<E>()?;

        let generation = self.cache.generation();
        let Some(item) = self.load(store, &domain, key)? else {
            self.cache.invalidate(&domain, key);
            return Ok(None);
        };

        let entity = self.relations(store).hydrate::<E>(&domain, &item)?;
        self.cache.replace_if_unchanged(&domain, key, item, generation);
        Ok(Some(entity))
    }

    /// Insert or update the entity's row.
    ///
    /// Only scalar attributes are written; children in relationship fields
    /// must be persisted on their own.
    pub fn persist<E: Entity>(&self, entity: &E) -> Result<()> {
        let store = self.open_store()?;
        let domain = self.domain_of::<E>()?;
        let key = entity.key();
        let attributes = entity.to_attributes();
        let generation = self.cache.generation();

        log_store_call(self.shared.print_queries, "put", &domain, key);
        store.put(&domain, key, &attributes).map_err(|source| {
            tracing::warn!(session = self.id, %domain, key, error = %source, "persist failed");
            Error::Write {
                domain: domain.clone(),
                key: key.to_string(),
                source,
            }
        })?;

        // A concurrent write to the cache leaves the key empty rather than
        // possibly older than the store.
        self.cache
            .replace_if_unchanged(&domain, key, Item::new(key, attributes), generation);
        Ok(())
    }

    /// Delete the entity's row and drop its cache entry.
    ///
    /// Already materialized collections that hold the entity keep it; reload
    /// the parent to observe the removal.
    pub fn remove<E: Entity>(&self, entity: &E) -> Result<()> {
        let store = self.open_store()?;
        let domain = self.domain_of::<E>()?;
        let key = entity.key();

        log_store_call(self.shared.print_queries, "delete", &domain, key);
        store.delete(&domain, key).map_err(|source| {
            tracing::warn!(session = self.id, %domain, key, error = %source, "remove failed");
            Error::Write {
                domain: domain.clone(),
                key: key.to_string(),
                source,
            }
        })?;

        self.cache.invalidate(&domain, key);
        Ok(())
    }

    /// Release the store handle. Closing twice is a no-op.
    ///
    /// Cache entries written by this session stay valid.
    pub fn close(&mut self) {
        if self.store.take().is_some() {
            tracing::debug!(session = self.id, "session closed");
        } else {
            tracing::debug!(session = self.id, "session already closed");
        }
    }

    fn open_store(&self) -> Result<&Arc<dyn AttributeStore>> {
        self.store.as_ref().ok_or(Error::SessionClosed)
    }

    fn domain_of<E: Entity>(&self) -> Result<String> {
        self.shared.domain_of::<E>()
    }

    fn relations(&self, store: &Arc<dyn AttributeStore>) -> Relations {
        Relations::new(store.clone(), self.cache.clone(), self.shared.clone())
    }

    fn load(
        &self,
        store: &Arc<dyn AttributeStore>,
        domain: &str,
        key: &str,
    ) -> Result<Option<Item>> {
        log_store_call(self.shared.print_queries, "get", domain, key);
        let item = store.get(domain, key).map_err(|source| {
            tracing::warn!(session = self.id, domain, key, error = %source, "find failed");
            Error::Load {
                domain: domain.to_string(),
                key: key.to_string(),
                source,
            }
        })?;

        if item.is_none() {
            tracing::debug!(session = self.id, domain, key, "not found");
        }
        Ok(item)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .field("cache", &self.cache.name())
            .finish()
    }
}

/// Log one store round trip, at `info` when query printing is enabled.
pub(crate) fn log_store_call(print_queries: bool, op: &'static str, domain: &str, key: &str) {
    if print_queries {
        tracing::info!(op, domain, key, "store call");
    } else {
        tracing::debug!(op, domain, key, "store call");
    }
}
