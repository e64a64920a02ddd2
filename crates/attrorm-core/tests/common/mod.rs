//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use parking_lot::Mutex;

use attrorm_core::error::StoreResult;
use attrorm_core::{
    AttributeStore, Attributes, CacheKind, CountingStore, Entity, FactoryConfig, Item, LazyList,
    MapCache, MappingError, Relations, Session, SessionFactory, SledStore, StoreError,
};

pub const UNIT: &str = "papeeriatestunit";

/// Parent entity with a one-to-many relationship to [`Page`].
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub msg: String,
    pub pages: LazyList<Page>,
}

impl Document {
    pub fn new(id: &str, msg: &str) -> Self {
        Self {
            id: id.to_string(),
            msg: msg.to_string(),
            pages: LazyList::new(),
        }
    }
}

impl Entity for Document {
    const DOMAIN: &'static str = "Document";

    fn key(&self) -> &str {
        &self.id
    }

    fn to_attributes(&self) -> Attributes {
        Attributes::new().with("msg", &self.msg)
    }

    fn from_item(item: &Item, relations: &Relations) -> Result<Self, MappingError> {
        Ok(Document {
            id: item.key.clone(),
            msg: item.require("msg")?.to_string(),
            pages: relations.one_to_many::<Page>("document", &item.key),
        })
    }
}

/// Child entity; `document` holds the parent's key.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    pub document: String,
}

impl Page {
    pub fn new(id: &str, document: &Document) -> Self {
        Self {
            id: id.to_string(),
            document: document.id.clone(),
        }
    }
}

impl Entity for Page {
    const DOMAIN: &'static str = "Page";

    fn key(&self) -> &str {
        &self.id
    }

    fn to_attributes(&self) -> Attributes {
        Attributes::new().with("document", &self.document)
    }

    fn from_item(item: &Item, _: &Relations) -> Result<Self, MappingError> {
        Ok(Page {
            id: item.key.clone(),
            document: item.require("document")?.to_string(),
        })
    }
}

/// Holds one store read open, after it has fetched its rows, until the test
/// releases it.
pub struct ReadGate {
    reached: Barrier,
    released: Barrier,
}

impl ReadGate {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            reached: Barrier::new(2),
            released: Barrier::new(2),
        })
    }

    /// Block until the paused read has its rows.
    pub fn wait_reached(&self) {
        self.reached.wait();
    }

    /// Let the paused read return.
    pub fn release(&self) {
        self.released.wait();
    }

    fn hold(&self) {
        self.reached.wait();
        self.released.wait();
    }
}

/// Sled store whose reads and writes can be made to fail or pause on demand.
pub struct FlakyStore {
    inner: SledStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    pause_get: Mutex<Option<Arc<ReadGate>>>,
    pause_query: Mutex<Option<Arc<ReadGate>>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SledStore::temporary().unwrap(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            pause_get: Mutex::new(None),
            pause_query: Mutex::new(None),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Pause the next `get` after it has read the row.
    pub fn pause_next_get(&self) -> Arc<ReadGate> {
        let gate = ReadGate::new();
        *self.pause_get.lock() = Some(gate.clone());
        gate
    }

    /// Pause the next `query` after it has read the rows.
    pub fn pause_next_query(&self) -> Arc<ReadGate> {
        let gate = ReadGate::new();
        *self.pause_query.lock() = Some(gate.clone());
        gate
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }
}

impl AttributeStore for FlakyStore {
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
        self.check_read()?;
        let row = self.inner.get(domain, key);
        let gate = self.pause_get.lock().take();
        if let Some(gate) = gate {
            gate.hold();
        }
        row
    }

    fn put(&self, domain: &str, key: &str, attributes: &Attributes) -> StoreResult<()> {
        self.check_write()?;
        self.inner.put(domain, key, attributes)
    }

    fn delete(&self, domain: &str, key: &str) -> StoreResult<()> {
        self.check_write()?;
        self.inner.delete(domain, key)
    }

    fn query(&self, domain: &str, attribute: &str, value: &str) -> StoreResult<Vec<Item>> {
        self.check_read()?;
        let rows = self.inner.query(domain, attribute, value);
        let gate = self.pause_query.lock().take();
        if let Some(gate) = gate {
            gate.hold();
        }
        rows
    }
}

/// A factory over an instrumented store.
pub struct Harness {
    pub factory: SessionFactory,
    pub store: Arc<CountingStore<FlakyStore>>,
}

impl Harness {
    pub fn new(cache: CacheKind) -> Self {
        Self::with_store(cache, Arc::new(CountingStore::new(FlakyStore::new())))
    }

    /// A second factory over the same store, with its own cache.
    pub fn with_store(cache: CacheKind, store: Arc<CountingStore<FlakyStore>>) -> Self {
        let config = FactoryConfig::temporary().with_unit(UNIT).with_cache(cache);
        let factory = SessionFactory::builder(config)
            .register::<Document>()
            .register::<Page>()
            .with_store(store.clone())
            .build()
            .unwrap();
        Self { factory, store }
    }

    pub fn session(&self) -> Session {
        self.factory.create_session().unwrap()
    }

    pub fn flaky(&self) -> &FlakyStore {
        self.store.inner()
    }

    pub fn map_cache(&self) -> Arc<MapCache> {
        self.factory.cache().as_map().unwrap().clone()
    }

    pub fn document_domain(&self) -> String {
        self.factory.domain_name::<Document>()
    }

    pub fn page_domain(&self) -> String {
        self.factory.domain_name::<Page>()
    }

    /// Persist document "foo" ("42") with pages o1_1, o1_2, o1_3.
    pub fn seed_foo(&self) {
        let mut session = self.session();
        let mut doc = Document::new("foo", "42");
        for id in ["o1_1", "o1_2", "o1_3"] {
            let page = Page::new(id, &doc);
            session.persist(&page).unwrap();
            doc.pages.push(page).unwrap();
        }
        session.persist(&doc).unwrap();
        session.close();
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.factory.drop_domains();
        let _ = self.factory.close();
    }
}
