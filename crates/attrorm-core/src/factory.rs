//! Process-wide session factory.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::CacheProvider;
use crate::config::{FactoryConfig, Properties};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::session::{Session, SessionShared};
use crate::store::{AttributeStore, SledStore};

/// Builder for [`SessionFactory`].
pub struct SessionFactoryBuilder {
    config: FactoryConfig,
    store: Option<Arc<dyn AttributeStore>>,
    registered: BTreeSet<&'static str>,
}

impl SessionFactoryBuilder {
    /// Register an entity type. Sessions reject unregistered types.
    pub fn register<E: Entity>(mut self) -> Self {
        self.registered.insert(E::DOMAIN);
        self
    }

    /// Use an existing store instead of opening one from the configuration.
    pub fn with_store(mut self, store: Arc<dyn AttributeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Open the store, build the cache and create every registered domain.
    pub fn build(self) -> Result<SessionFactory> {
        let store: Arc<dyn AttributeStore> = match self.store {
            Some(store) => store,
            None => Arc::new(SledStore::open(&self.config.store)?),
        };

        let naming = self.config.naming();
        for logical in &self.registered {
            store.create_domain(&naming.domain_name(logical))?;
        }

        let cache = CacheProvider::build(self.config.cache);
        tracing::info!(
            unit = ?self.config.unit,
            cache = %self.config.cache,
            entities = self.registered.len(),
            "session factory ready"
        );

        let shared = Arc::new(SessionShared {
            naming,
            registered: self.registered,
            print_queries: self.config.print_queries,
        });

        Ok(SessionFactory {
            config: self.config,
            store,
            cache,
            shared,
            next_session_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }
}

/// Long-lived source of sessions.
///
/// Owns the store handle and the one cache instance every session shares.
/// Construct once at startup and close once at shutdown.
pub struct SessionFactory {
    config: FactoryConfig,
    store: Arc<dyn AttributeStore>,
    cache: CacheProvider,
    shared: Arc<SessionShared>,
    next_session_id: AtomicU64,
    closed: AtomicBool,
}

impl SessionFactory {
    /// Start building a factory.
    pub fn builder(config: FactoryConfig) -> SessionFactoryBuilder {
        SessionFactoryBuilder {
            config,
            store: None,
            registered: BTreeSet::new(),
        }
    }

    /// Start building a factory for persistence unit `unit` from a property
    /// set. Invalid values fail here.
    pub fn from_properties(
        unit: impl Into<String>,
        props: &Properties,
    ) -> Result<SessionFactoryBuilder> {
        let config = FactoryConfig::from_properties(props)?.with_unit(unit);
        Ok(Self::builder(config))
    }

    /// Like [`SessionFactory::from_properties`], reading the properties file
    /// first. A missing file fails with [`ConfigError::NotFound`] before any
    /// store is opened.
    ///
    /// [`ConfigError::NotFound`]: crate::error::ConfigError::NotFound
    pub fn from_properties_file(
        unit: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<SessionFactoryBuilder> {
        let path = path.as_ref();
        let props = Properties::load(path).map_err(|e| {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "cannot initialize session factory"
            );
            e
        })?;
        Self::from_properties(unit, &props)
    }

    /// Open a new session.
    pub fn create_session(&self) -> Result<Session> {
        if self.is_closed() {
            return Err(Error::FactoryClosed);
        }
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        Ok(Session::new(
            id,
            self.store.clone(),
            self.cache.cache(),
            self.shared.clone(),
        ))
    }

    /// The configuration this factory was built from.
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// The cache shared by all sessions.
    pub fn cache(&self) -> &CacheProvider {
        &self.cache
    }

    /// The underlying store, for bootstrap and teardown.
    pub fn store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    /// Store domain of an entity type.
    pub fn domain_name<E: Entity>(&self) -> String {
        self.shared.naming.domain_of::<E>()
    }

    /// Store domains of all registered entity types.
    pub fn domains(&self) -> Vec<String> {
        self.shared
            .registered
            .iter()
            .map(|logical| self.shared.naming.domain_name(logical))
            .collect()
    }

    /// Delete every registered domain and clear the cache.
    pub fn drop_domains(&self) -> Result<()> {
        for domain in self.domains() {
            tracing::info!(%domain, "deleting domain");
            self.store.delete_domain(&domain)?;
        }
        self.cache.clear();
        Ok(())
    }

    /// Check whether the factory has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Flush the store and stop handing out sessions. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.store.flush()?;
        tracing::info!("session factory closed");
        Ok(())
    }
}

impl std::fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("closed", &self.is_closed())
            .finish()
    }
}
