//! Lazily materialized one-to-many collections.

use std::fmt;

use once_cell::sync::OnceCell;

use crate::entity::{Entity, Relations};
use crate::error::{Error, Result};
use crate::session::log_store_call;

/// Ordered collection of child entities behind a relationship field.
///
/// A list bound by [`Relations::one_to_many`] starts unmaterialized. The
/// first structural read (`len`, `get`, `iter`, ...) runs one foreign-key
/// query and keeps the children in the order the store returned them; later
/// reads never query again. Concurrent first reads share a single load.
///
/// Mutations only change the in-memory list. Persisting or removing the
/// affected entities is up to the caller.
#[derive(Clone)]
pub struct LazyList<C> {
    binding: Option<Binding>,
    items: OnceCell<Vec<C>>,
}

#[derive(Clone)]
struct Binding {
    relations: Relations,
    domain: String,
    foreign_key: String,
    parent_key: String,
}

impl<C: Entity> LazyList<C> {
    /// Create an empty, already materialized list for a new parent.
    pub fn new() -> Self {
        Self {
            binding: None,
            items: OnceCell::with_value(Vec::new()),
        }
    }

    pub(crate) fn bound(
        relations: Relations,
        domain: String,
        foreign_key: String,
        parent_key: String,
    ) -> Self {
        Self {
            binding: Some(Binding {
                relations,
                domain,
                foreign_key,
                parent_key,
            }),
            items: OnceCell::new(),
        }
    }

    /// Check whether the children have been loaded.
    pub fn is_materialized(&self) -> bool {
        self.items.get().is_some()
    }

    /// Key of the parent this list is bound to, if any.
    pub fn parent_key(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.parent_key.as_str())
    }

    /// All children, loading them on first use.
    pub fn as_slice(&self) -> Result<&[C]> {
        self.items
            .get_or_try_init(|| self.load())
            .map(Vec::as_slice)
    }

    /// Number of children.
    pub fn len(&self) -> Result<usize> {
        Ok(self.as_slice()?.len())
    }

    /// Check if there are no children.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.as_slice()?.is_empty())
    }

    /// Child at `index`.
    pub fn get(&self, index: usize) -> Result<Option<&C>> {
        Ok(self.as_slice()?.get(index))
    }

    /// Iterate children in order.
    pub fn iter(&self) -> Result<std::slice::Iter<'_, C>> {
        Ok(self.as_slice()?.iter())
    }

    /// Keys of all children in order.
    pub fn keys(&self) -> Result<Vec<&str>> {
        Ok(self.as_slice()?.iter().map(Entity::key).collect())
    }

    /// Copy the children out.
    pub fn to_vec(&self) -> Result<Vec<C>>
    where
        C: Clone,
    {
        Ok(self.as_slice()?.to_vec())
    }

    /// Append a child, loading the existing children first if needed.
    pub fn push(&mut self, child: C) -> Result<()> {
        let mut items = match self.items.take() {
            Some(items) => items,
            None => self.load()?,
        };
        items.push(child);
        self.items = OnceCell::with_value(items);
        Ok(())
    }

    /// Remove the child with `key` from the in-memory list.
    ///
    /// Never loads: on an unmaterialized list this returns `None`, and a
    /// later load reflects the store only.
    pub fn remove(&mut self, key: &str) -> Option<C> {
        let items = self.items.get_mut()?;
        let index = items.iter().position(|c| c.key() == key)?;
        Some(items.remove(index))
    }

    fn load(&self) -> Result<Vec<C>> {
        let Some(binding) = &self.binding else {
            return Ok(Vec::new());
        };
        let relations = &binding.relations;
        relations.registered_domain_of::<C>()?;
        let cache = relations.cache();
        let generation = cache.generation();

        log_store_call(
            relations.print_queries(),
            "query",
            &binding.domain,
            &binding.parent_key,
        );
        let rows = relations
            .store()
            .query(&binding.domain, &binding.foreign_key, &binding.parent_key)
            .map_err(|source| {
                tracing::warn!(
                    domain = %binding.domain,
                    parent = %binding.parent_key,
                    error = %source,
                    "collection load failed"
                );
                Error::Load {
                    domain: binding.domain.clone(),
                    key: binding.parent_key.clone(),
                    source,
                }
            })?;

        let children = rows
            .iter()
            .map(|item| relations.hydrate::<C>(&binding.domain, item))
            .collect::<Result<Vec<_>>>()?;

        // Rows read before a concurrent write are not cached.
        for item in rows {
            let key = item.key.clone();
            if !cache.put_if_unchanged(&binding.domain, &key, item, generation) {
                break;
            }
        }

        tracing::debug!(
            domain = %binding.domain,
            parent = %binding.parent_key,
            count = children.len(),
            "collection materialized"
        );
        Ok(children)
    }
}

impl<C: Entity> Default for LazyList<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Entity> From<Vec<C>> for LazyList<C> {
    fn from(items: Vec<C>) -> Self {
        Self {
            binding: None,
            items: OnceCell::with_value(items),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for LazyList<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("LazyList");
        if let Some(binding) = &self.binding {
            s.field("domain", &binding.domain)
                .field("parent_key", &binding.parent_key);
        }
        match self.items.get() {
            Some(items) => s.field("items", items),
            None => s.field("items", &"<unmaterialized>"),
        };
        s.finish()
    }
}
