//! Lazy collection behavior through real sessions.

mod common;

use attrorm_core::{Cache, CacheKey, CacheKind};
use common::{Document, Harness, Page};

fn run_delete_scenario(cache: CacheKind) {
    let h = Harness::new(cache);
    h.seed_foo();

    let mut session = h.session();
    let mut doc = session.find::<Document>("foo").unwrap().unwrap();
    session.close();
    // The collection still loads after its session is gone.
    assert_eq!(doc.pages.len().unwrap(), 3);

    let to_delete = doc
        .pages
        .iter()
        .unwrap()
        .find(|p| p.id == "o1_2")
        .cloned()
        .unwrap();
    assert!(doc.pages.remove(&to_delete.id).is_some());
    assert_eq!(doc.pages.len().unwrap(), 2);

    let mut session = h.session();
    session.remove(&to_delete).unwrap();
    session.persist(&doc).unwrap();
    session.close();

    let mut session = h.session();
    let reloaded = session.find::<Document>("foo").unwrap().unwrap();
    session.close();
    assert_eq!(reloaded.pages.len().unwrap(), 2);
    assert_eq!(reloaded.pages.keys().unwrap(), vec!["o1_1", "o1_3"]);
}

#[test]
fn test_delete_without_cache() {
    run_delete_scenario(CacheKind::PassThrough);
}

#[test]
fn test_delete_with_map_cache() {
    run_delete_scenario(CacheKind::Map);
}

#[test]
fn test_added_child_survives_cache_clear() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();
    let cache = h.map_cache();
    cache.clear();

    {
        let mut session = h.session();
        let mut doc = session.find::<Document>("foo").unwrap().unwrap();
        session.close();

        cache.clear();

        let new_page = Page::new("new", &doc);
        doc.pages.push(new_page.clone()).unwrap();

        let mut session = h.session();
        session.persist(&new_page).unwrap();
        session.persist(&doc).unwrap();
        session.close();
    }

    let mut session = h.session();
    let doc = session.find::<Document>("foo").unwrap().unwrap();
    session.close();

    assert_eq!(doc.msg, "42");
    assert_eq!(doc.pages.len().unwrap(), 4);
    assert_eq!(
        doc.pages.keys().unwrap(),
        vec!["o1_1", "o1_2", "o1_3", "new"]
    );
    assert_eq!(doc.pages.get(3).unwrap().unwrap().id, "new");

    let docs = h.document_domain();
    let pages = h.page_domain();
    assert_eq!(
        cache.keys(),
        vec![
            CacheKey::new(&docs, "foo"),
            CacheKey::new(&pages, "new"),
            CacheKey::new(&pages, "o1_1"),
            CacheKey::new(&pages, "o1_2"),
            CacheKey::new(&pages, "o1_3"),
        ]
    );

    h.factory.close().unwrap();
}

#[test]
fn test_first_read_loads_once() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();

    let session = h.session();
    let doc = session.find::<Document>("foo").unwrap().unwrap();
    h.store.counters().reset();

    assert!(!doc.pages.is_materialized());
    assert_eq!(doc.pages.parent_key(), Some("foo"));
    assert_eq!(h.store.counts().queries, 0);

    assert_eq!(doc.pages.len().unwrap(), 3);
    assert!(doc.pages.is_materialized());
    assert_eq!(h.store.counts().queries, 1);

    assert_eq!(doc.pages.get(0).unwrap().unwrap().id, "o1_1");
    assert_eq!(doc.pages.iter().unwrap().count(), 3);
    assert!(!doc.pages.is_empty().unwrap());
    assert_eq!(doc.pages.to_vec().unwrap()[2].document, "foo");
    assert_eq!(h.store.counts().queries, 1);
}

#[test]
fn test_each_loaded_parent_has_its_own_snapshot() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();

    let session = h.session();
    let first = session.find::<Document>("foo").unwrap().unwrap();
    let second = session.find::<Document>("foo").unwrap().unwrap();
    h.store.counters().reset();

    first.pages.len().unwrap();
    second.pages.len().unwrap();
    assert_eq!(h.store.counts().queries, 2);
}

#[test]
fn test_concurrent_first_reads_share_one_load() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();

    let session = h.session();
    let doc = session.find::<Document>("foo").unwrap().unwrap();
    h.store.counters().reset();

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| assert_eq!(doc.pages.len().unwrap(), 3));
        }
    });

    assert_eq!(h.store.counts().queries, 1);
}

#[test]
fn test_remove_before_access_does_not_load() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();

    let session = h.session();
    let mut doc = session.find::<Document>("foo").unwrap().unwrap();
    h.store.counters().reset();

    assert!(doc.pages.remove("o1_2").is_none());
    assert!(!doc.pages.is_materialized());
    assert_eq!(h.store.counts().queries, 0);

    // The unpersisted removal is not reflected by the load.
    assert_eq!(doc.pages.keys().unwrap(), vec!["o1_1", "o1_2", "o1_3"]);
}

#[test]
fn test_push_loads_existing_children_first() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();

    let session = h.session();
    let mut doc = session.find::<Document>("foo").unwrap().unwrap();
    let extra = Page::new("o1_4", &doc);
    doc.pages.push(extra).unwrap();

    assert_eq!(
        doc.pages.keys().unwrap(),
        vec!["o1_1", "o1_2", "o1_3", "o1_4"]
    );

    // Not persisted, so a reload does not see it.
    let reloaded = session.find::<Document>("foo").unwrap().unwrap();
    assert_eq!(reloaded.pages.len().unwrap(), 3);
}

#[test]
fn test_materialized_list_is_a_snapshot() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();

    let session = h.session();
    let doc = session.find::<Document>("foo").unwrap().unwrap();
    assert_eq!(doc.pages.len().unwrap(), 3);

    let victim = doc.pages.get(1).unwrap().unwrap().clone();
    session.remove(&victim).unwrap();

    assert_eq!(doc.pages.len().unwrap(), 3);

    let other = h.session();
    let reloaded = other.find::<Document>("foo").unwrap().unwrap();
    assert_eq!(reloaded.pages.len().unwrap(), 2);
    assert!(reloaded.pages.iter().unwrap().all(|p| p.id != victim.id));
}

#[test]
fn test_failed_load_can_be_retried() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();

    let session = h.session();
    let doc = session.find::<Document>("foo").unwrap().unwrap();

    h.flaky().fail_reads(true);
    let err = doc.pages.len().unwrap_err();
    assert!(err.is_load_failure());
    assert!(!doc.pages.is_materialized());

    h.flaky().fail_reads(false);
    assert_eq!(doc.pages.len().unwrap(), 3);
}

#[test]
fn test_materialization_caches_children() {
    let h = Harness::new(CacheKind::Map);
    h.seed_foo();
    let cache = h.map_cache();
    cache.clear();

    let session = h.session();
    let doc = session.find::<Document>("foo").unwrap().unwrap();
    assert_eq!(cache.len(), 1);

    doc.pages.len().unwrap();
    assert_eq!(cache.len(), 4);
    assert!(cache.contains(&h.page_domain(), "o1_3"));

    // Children now come out of the cache.
    h.store.counters().reset();
    let page = session.find::<Page>("o1_3").unwrap().unwrap();
    assert_eq!(page.document, "foo");
    assert_eq!(h.store.counts().gets, 0);
}

#[test]
fn test_parent_without_children() {
    let h = Harness::new(CacheKind::PassThrough);

    let session = h.session();
    session.persist(&Document::new("empty", "0")).unwrap();

    let doc = session.find::<Document>("empty").unwrap().unwrap();
    assert!(doc.pages.is_empty().unwrap());
    assert!(doc.pages.get(0).unwrap().is_none());
}
