//! Mapping between entity types and attribute rows.

use std::sync::Arc;

use crate::cache::Cache;
use crate::error::{Error, MappingError, Result};
use crate::lazy::LazyList;
use crate::session::SessionShared;
use crate::store::{AttributeStore, Attributes, Item};

/// A typed record stored as one row of its domain.
///
/// Relationship fields are not attributes: a parent exposes its children as
/// a [`LazyList`] bound in [`Entity::from_item`], and each child stores the
/// parent's key as a plain attribute.
///
/// ```ignore
/// impl Entity for Page {
///     const DOMAIN: &'static str = "Page";
///
///     fn key(&self) -> &str {
///         &self.id
///     }
///
///     fn to_attributes(&self) -> Attributes {
///         Attributes::new().with("document", &self.document)
///     }
///
///     fn from_item(item: &Item, _: &Relations) -> Result<Self, MappingError> {
///         Ok(Page {
///             id: item.key.clone(),
///             document: item.require("document")?.to_string(),
///         })
///     }
/// }
/// ```
pub trait Entity: Sized {
    /// Logical domain name, before the factory's naming is applied.
    const DOMAIN: &'static str;

    /// Primary key.
    fn key(&self) -> &str;

    /// Scalar attributes to write. Relationship fields are not included.
    fn to_attributes(&self) -> Attributes;

    /// Build an entity from a loaded row, binding relationship fields
    /// through `relations`.
    fn from_item(item: &Item, relations: &Relations) -> std::result::Result<Self, MappingError>;
}

/// Maps logical domain names to store domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainNaming {
    unit: Option<String>,
}

impl DomainNaming {
    /// Use logical names unchanged.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Prefix every domain with a persistence-unit name.
    pub fn with_unit(unit: impl Into<String>) -> Self {
        Self {
            unit: Some(unit.into()),
        }
    }

    /// Store domain for a logical name.
    pub fn domain_name(&self, logical: &str) -> String {
        match &self.unit {
            Some(unit) => format!("{}-{}", unit, logical),
            None => logical.to_string(),
        }
    }

    /// Store domain for an entity type.
    pub fn domain_of<E: Entity>(&self) -> String {
        self.domain_name(E::DOMAIN)
    }
}

/// Hydration context handed to [`Entity::from_item`].
///
/// Holds the shared store and cache handles, so collections bound through it
/// stay loadable after the session that produced the parent is closed.
#[derive(Clone)]
pub struct Relations {
    store: Arc<dyn AttributeStore>,
    cache: Arc<dyn Cache>,
    shared: Arc<SessionShared>,
}

impl Relations {
    pub(crate) fn new(
        store: Arc<dyn AttributeStore>,
        cache: Arc<dyn Cache>,
        shared: Arc<SessionShared>,
    ) -> Self {
        Self {
            store,
            cache,
            shared,
        }
    }

    /// Bind a one-to-many collection: all `C` rows whose `foreign_key`
    /// attribute equals `parent_key`. Nothing is loaded until first read,
    /// and the first read fails with [`Error::UnregisteredEntity`] if `C`
    /// was not registered with the factory.
    pub fn one_to_many<C: Entity>(&self, foreign_key: &str, parent_key: &str) -> LazyList<C> {
        LazyList::bound(
            self.clone(),
            self.shared.naming.domain_of::<C>(),
            foreign_key.to_string(),
            parent_key.to_string(),
        )
    }

    /// Store domain for an entity type.
    pub fn domain_of<E: Entity>(&self) -> String {
        self.shared.naming.domain_of::<E>()
    }

    /// Store domain for an entity type the factory registered.
    pub(crate) fn registered_domain_of<E: Entity>(&self) -> Result<String> {
        self.shared.domain_of::<E>()
    }

    pub(crate) fn store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    pub(crate) fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub(crate) fn print_queries(&self) -> bool {
        self.shared.print_queries
    }

    /// Map a loaded row onto `E`.
    pub(crate) fn hydrate<E: Entity>(&self, domain: &str, item: &Item) -> Result<E> {
        E::from_item(item, self).map_err(|source| Error::Mapping {
            domain: domain.to_string(),
            key: item.key.clone(),
            source,
        })
    }
}
