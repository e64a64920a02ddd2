//! Sled-backed attribute store.

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};

use super::record::StoredRow;
use super::{AttributeStore, Attributes, Item, StoreConfig};
use crate::error::{StoreError, StoreResult};

/// Tree name for the domain registry.
const DOMAINS_TREE: &str = "domains";

/// Prefix of per-domain item trees (key -> stored row).
const ITEM_TREE_PREFIX: &str = "item:";

/// Prefix of per-domain order trees (sequence -> key).
const ORDER_TREE_PREFIX: &str = "order:";

/// Attribute store on top of sled.
///
/// Each domain owns two trees: the items themselves and an order index
/// keyed by big-endian insertion sequence, so that a foreign-key query
/// returns rows in the order they were first written.
pub struct SledStore {
    /// The underlying sled database.
    db: Db,

    /// Registry of created domains.
    domains: Tree,
}

impl SledStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let db = config.to_sled_config().open()?;
        let domains = db.open_tree(DOMAINS_TREE)?;
        Ok(Self { db, domains })
    }

    /// Open a temporary store that is deleted on drop.
    pub fn temporary() -> StoreResult<Self> {
        Self::open(&StoreConfig::temporary())
    }

    /// Check if the database was recovered from a previous crash.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Get database size in bytes.
    pub fn size_on_disk(&self) -> StoreResult<u64> {
        Ok(self.db.size_on_disk()?)
    }

    /// Open the item and order trees of an existing domain.
    fn domain_trees(&self, domain: &str) -> StoreResult<(Tree, Tree)> {
        if !self.domains.contains_key(domain.as_bytes())? {
            return Err(StoreError::NoSuchDomain(domain.to_string()));
        }
        let items = self.db.open_tree(item_tree_name(domain))?;
        let order = self.db.open_tree(order_tree_name(domain))?;
        Ok((items, order))
    }
}

impl AttributeStore for SledStore {
    fn create_domain(&self, domain: &str) -> StoreResult<()> {
        self.db.open_tree(item_tree_name(domain))?;
        self.db.open_tree(order_tree_name(domain))?;
        self.domains.insert(domain.as_bytes(), Vec::<u8>::new())?;
        tracing::debug!(domain, "domain created");
        Ok(())
    }

    fn delete_domain(&self, domain: &str) -> StoreResult<()> {
        if self.domains.remove(domain.as_bytes())?.is_none() {
            return Ok(());
        }
        self.db.drop_tree(item_tree_name(domain))?;
        self.db.drop_tree(order_tree_name(domain))?;
        tracing::debug!(domain, "domain deleted");
        Ok(())
    }

    fn list_domains(&self) -> StoreResult<Vec<String>> {
        self.domains
            .iter()
            .keys()
            .map(|key| {
                let key = key?;
                String::from_utf8(key.to_vec())
                    .map_err(|e| StoreError::Deserialization(e.to_string()))
            })
            .collect()
    }

    fn get(&self, domain: &str, key: &str) -> StoreResult<Option<Item>> {
        let (items, _) = self.domain_trees(domain)?;
        match items.get(key.as_bytes())? {
            Some(bytes) => {
                let row = StoredRow::from_bytes(&bytes)?;
                Ok(Some(Item::new(key, row.into_attributes())))
            }
            None => Ok(None),
        }
    }

    fn put(&self, domain: &str, key: &str, attributes: &Attributes) -> StoreResult<()> {
        let (items, order) = self.domain_trees(domain)?;

        // Only consumed when the key is new.
        let candidate_seq = self.db.generate_id()?;

        let result: Result<(), TransactionError<StoreError>> =
            (&items, &order).transaction(|(items_tx, order_tx)| {
                let seq = match items_tx.get(key.as_bytes())? {
                    Some(existing) => {
                        StoredRow::from_bytes(&existing)
                            .map_err(ConflictableTransactionError::Abort)?
                            .seq
                    }
                    None => {
                        order_tx.insert(&candidate_seq.to_be_bytes()[..], key.as_bytes())?;
                        candidate_seq
                    }
                };

                let bytes = StoredRow::new(seq, attributes)
                    .to_bytes()
                    .map_err(ConflictableTransactionError::Abort)?;
                items_tx.insert(key.as_bytes(), bytes)?;
                Ok(())
            });

        finish_transaction(result)
    }

    fn delete(&self, domain: &str, key: &str) -> StoreResult<()> {
        let (items, order) = self.domain_trees(domain)?;

        let result: Result<(), TransactionError<StoreError>> =
            (&items, &order).transaction(|(items_tx, order_tx)| {
                if let Some(existing) = items_tx.remove(key.as_bytes())? {
                    let row = StoredRow::from_bytes(&existing)
                        .map_err(ConflictableTransactionError::Abort)?;
                    order_tx.remove(&row.seq.to_be_bytes()[..])?;
                }
                Ok(())
            });

        finish_transaction(result)
    }

    fn query(&self, domain: &str, attribute: &str, value: &str) -> StoreResult<Vec<Item>> {
        let (items, order) = self.domain_trees(domain)?;
        let mut rows = Vec::new();

        for entry in order.iter() {
            let (_, key_bytes) = entry?;
            // A concurrent delete may have removed the item after we read the index.
            let Some(bytes) = items.get(&key_bytes)? else {
                continue;
            };
            let row = StoredRow::from_bytes(&bytes)?;
            let attributes = row.into_attributes();
            if attributes.get(attribute) != Some(value) {
                continue;
            }
            let key = String::from_utf8(key_bytes.to_vec())
                .map_err(|e| StoreError::Deserialization(e.to_string()))?;
            rows.push(Item::new(key, attributes));
        }

        Ok(rows)
    }

    fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn finish_transaction(result: Result<(), TransactionError<StoreError>>) -> StoreResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(TransactionError::Abort(e)) => Err(e),
        Err(TransactionError::Storage(e)) => Err(StoreError::Storage(e)),
    }
}

fn item_tree_name(domain: &str) -> String {
    format!("{ITEM_TREE_PREFIX}{domain}")
}

fn order_tree_name(domain: &str) -> String {
    format!("{ORDER_TREE_PREFIX}{domain}")
}
