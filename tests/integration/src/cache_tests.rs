//! Cache integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use xds_distribution::prelude::*;

fn resource(name: &str, payload: &str) -> Arc<AnyResource> {
    Arc::new(AnyResource::from_bytes(TypeUrl::CLUSTER, name, payload.as_bytes()))
}

fn set(entries: &[(&str, &str)]) -> HashMap<String, Arc<AnyResource>> {
    entries
        .iter()
        .map(|(name, payload)| (name.to_string(), resource(name, payload)))
        .collect()
}

fn names(resources: &[Arc<AnyResource>]) -> Vec<String> {
    resources.iter().map(|r| r.name().to_string()).collect()
}

#[test]
fn cache_basic_operations() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
    assert!(cache.contents().is_empty());

    cache.update(set(&[("b", "2"), ("c", "3"), ("a", "1")]));

    assert_eq!(names(&cache.contents()), vec!["a", "b", "c"]);
    assert_eq!(cache.type_url().as_str(), TypeUrl::CLUSTER);
}

#[test]
fn cache_update_replaces_whole_set() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);

    cache.update(set(&[("a", "1"), ("b", "2")]));
    cache.update(set(&[("c", "3")]));

    assert_eq!(names(&cache.contents()), vec!["c"]);
    assert!(cache.query(&["a", "b"]).is_empty());

    cache.update(HashMap::new());
    assert!(cache.is_empty());
}

#[test]
fn cache_query_order_and_omission() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
    cache.update(set(&[("a", "1"), ("b", "2"), ("c", "3")]));

    let found = cache.query(&["c", "missing", "a"]);
    assert_eq!(names(&found), vec!["a", "c"]);

    assert!(cache.query::<&str>(&[]).is_empty());
    assert_eq!(cache.query(&["a", "a"]).len(), 1);
}

#[test]
fn cache_reads_are_independent_copies() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
    cache.update(set(&[("a", "1")]));

    let mut first = cache.contents();
    first.clear();

    assert_eq!(cache.contents().len(), 1);
}

#[test]
fn caches_of_different_types_are_independent() {
    let registry = CacheRegistry::new();
    let clusters = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER));
    let listeners = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::LISTENER));
    registry.register(clusters.clone()).expect("register clusters");
    registry.register(listeners.clone()).expect("register listeners");

    let mut listener_watch = listeners.watch();
    clusters.update(set(&[("a", "1")]));

    assert!(!listener_watch.has_changed());
    assert!(registry.require(TypeUrl::LISTENER).expect("listeners").is_empty());
    assert_eq!(registry.require(TypeUrl::CLUSTER).expect("clusters").len(), 1);

    listeners.update(HashMap::new());
    assert!(listener_watch.has_changed());
    listener_watch.mark_seen(listeners.notifier().generation());
    assert!(!listener_watch.has_changed());
}

#[test]
fn snapshot_version_tracks_content() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);

    cache.update(set(&[("a", "1"), ("b", "2")]));
    let first = cache.snapshot().version().expect("version");

    cache.update(set(&[("b", "2"), ("a", "1")]));
    let same = cache.snapshot().version().expect("version");

    cache.update(set(&[("a", "1"), ("b", "changed")]));
    let changed = cache.snapshot().version().expect("version");

    assert_eq!(first, same);
    assert_ne!(first, changed);
}

#[tokio::test]
async fn watch_wakes_on_update() {
    let cache = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER));
    let mut watch = cache.watch();

    let updater = Arc::clone(&cache);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        updater.update(set(&[("a", "1")]));
    });

    let generation = tokio::time::timeout(Duration::from_secs(5), watch.changed())
        .await
        .expect("watch should wake");

    assert_eq!(generation, 1);
    assert_eq!(names(&cache.contents()), vec!["a"]);
}

#[tokio::test]
async fn update_before_wait_is_not_lost() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
    let mut watch = cache.watch();

    cache.update(set(&[("a", "1")]));

    let generation = tokio::time::timeout(Duration::from_millis(100), watch.changed())
        .await
        .expect("update made before waiting must still wake");
    assert_eq!(generation, 1);
}

#[tokio::test]
async fn watch_reports_latest_generation() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
    let mut watch = cache.watch();

    for _ in 0..5 {
        cache.update(set(&[("a", "1")]));
    }

    assert_eq!(watch.changed().await, 5);
    assert!(!watch.has_changed());
}

#[tokio::test]
async fn cancelled_watch_returns_none() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
    let mut watch = cache.watch();

    let result = watch
        .changed_or_cancel(tokio::time::sleep(Duration::from_millis(10)))
        .await;

    assert!(result.is_none());
    assert_eq!(cache.notifier().waiter_count(), 0);
}

#[tokio::test]
async fn discovery_cache_serves_encoded_resources() {
    let cache = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER));
    let served: Arc<dyn DiscoveryCache> = cache.clone();

    cache.update(set(&[("b", "2"), ("a", "1")]));

    let contents = served.encoded_contents().expect("encode");
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].value, b"1");

    let queried = served
        .encoded_query(&["b".to_string(), "zzz".to_string()])
        .expect("encode");
    assert_eq!(queried.len(), 1);
    assert_eq!(queried[0].value, b"2");
}
