//! Load tests for the distribution core.
//!
//! These tests verify behaviour under high load:
//! - 1000+ resources per update
//! - 1000 parked discovery streams woken by one update
//! - Concurrent readers and writers never observing a mixed set
//! - Graph recomputation at scale
//!
//! Run with: `cargo test --package integration-tests --test load_tests -- --nocapture`

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Barrier;
use xds_distribution::prelude::*;

/// Create a set of `size` resources, every payload tagged with `tag`.
fn create_set(size: usize, tag: u64) -> HashMap<String, Arc<AnyResource>> {
    (0..size)
        .map(|i| {
            let name = format!("default/service-{i}/80/0123456789");
            let resource =
                AnyResource::from_bytes(TypeUrl::CLUSTER, name.clone(), tag.to_be_bytes().to_vec());
            (name, Arc::new(resource))
        })
        .collect()
}

fn tag_of(resource: &AnyResource) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&resource.inner().value);
    u64::from_be_bytes(bytes)
}

/// Test updating and reading 1000 resources.
#[tokio::test]
async fn test_1000_resources() {
    let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
    let size = 1000;

    let start = Instant::now();
    cache.update(create_set(size, 1));
    let update_duration = start.elapsed();

    let start = Instant::now();
    let contents = cache.contents();
    let read_duration = start.elapsed();

    println!(
        "Update of {} resources in {:?}, sorted read in {:?}",
        size, update_duration, read_duration
    );

    assert_eq!(contents.len(), size);
    assert!(contents.windows(2).all(|w| w[0].name() <= w[1].name()));
}

/// Test one update waking 1000 parked watches.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_1000_watchers_woken() {
    let cache = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER));
    let num_watchers = 1000;

    let handles: Vec<_> = (0..num_watchers)
        .map(|_| {
            let mut watch = cache.watch();
            tokio::spawn(async move {
                tokio::time::timeout(Duration::from_secs(10), watch.changed()).await
            })
        })
        .collect();

    // Let some of them park; the rest must still see the update.
    tokio::task::yield_now().await;

    let start = Instant::now();
    cache.update(create_set(10, 1));
    let notify_duration = start.elapsed();

    let mut woken = 0;
    for result in futures::future::join_all(handles).await {
        let generation = result.expect("Task panicked").expect("watch timed out");
        assert_eq!(generation, 1);
        woken += 1;
    }

    println!(
        "Woke {} watchers in {:?} (update call)",
        woken, notify_duration
    );

    assert_eq!(woken, num_watchers);
    assert_eq!(cache.notifier().waiter_count(), 0);
}

/// Stress test: readers never see a mix of two updates.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_writers() {
    let cache = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER));
    let num_readers = 8;
    let num_writers = 2;
    let ops_per_task = 500;
    let set_size = 50;

    cache.update(create_set(set_size, 0));

    let barrier = Arc::new(Barrier::new(num_readers + num_writers));
    let read_count = Arc::new(AtomicU64::new(0));
    let write_count = Arc::new(AtomicU64::new(0));

    let start = Instant::now();
    let mut handles = Vec::new();

    // Spawn readers
    for _ in 0..num_readers {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        let read_count = Arc::clone(&read_count);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;

            for _ in 0..ops_per_task {
                let contents = cache.contents();
                assert_eq!(contents.len(), set_size);

                let tag = tag_of(&contents[0]);
                assert!(
                    contents.iter().all(|r| tag_of(r) == tag),
                    "reader observed a mixed set"
                );
                read_count.fetch_add(1, Ordering::Relaxed);
                tokio::task::yield_now().await;
            }
        }));
    }

    // Spawn writers
    for writer_id in 0..num_writers {
        let cache = Arc::clone(&cache);
        let barrier = Arc::clone(&barrier);
        let write_count = Arc::clone(&write_count);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;

            for i in 0..ops_per_task {
                let tag = (writer_id as u64 + 1) * 1_000_000 + i as u64;
                cache.update(create_set(set_size, tag));
                write_count.fetch_add(1, Ordering::Relaxed);
                tokio::task::yield_now().await;
            }
        }));
    }

    // Wait for all tasks
    for handle in handles {
        handle.await.expect("Task panicked");
    }

    let duration = start.elapsed();
    let total_reads = read_count.load(Ordering::Relaxed);
    let total_writes = write_count.load(Ordering::Relaxed);

    println!(
        "Concurrent R/W: {} reads, {} writes in {:?}",
        total_reads, total_writes, duration
    );

    assert_eq!(total_writes, (num_writers * ops_per_task) as u64);
    assert_eq!(
        cache.notifier().generation(),
        1 + (num_writers * ops_per_task) as u64
    );
}

/// Test a waiting stream that reads after every wakeup sees the final set.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stream_converges_to_last_update() {
    let cache = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER));
    let updates = 200u64;

    let reader_cache = Arc::clone(&cache);
    let mut watch = cache.watch();
    let reader = tokio::spawn(async move {
        loop {
            let generation = tokio::time::timeout(Duration::from_secs(10), watch.changed())
                .await
                .expect("reader stalled");
            let contents = reader_cache.contents();
            if generation == updates {
                return tag_of(&contents[0]);
            }
        }
    });

    for tag in 1..=updates {
        cache.update(create_set(5, tag));
        if tag % 16 == 0 {
            tokio::task::yield_now().await;
        }
    }

    assert_eq!(reader.await.expect("Task panicked"), updates);
}

/// Test recomputing a large graph.
#[test]
fn test_graph_recompute_5000_upstreams() {
    let cache = Arc::new(ClusterCache::new(TypeUrl::CLUSTER));
    let handler = GraphChangeHandler::<ConfigGraph, _>::new(cache.clone(), ClusterTranslator::default());

    let mut graph = ConfigGraph::new();
    for i in 0..5000u16 {
        graph.push_cluster(UpstreamCluster::new("default", format!("service-{i}"), 80));
        // Every tenth upstream is routed twice.
        if i % 10 == 0 {
            graph.push_cluster(UpstreamCluster::new("default", format!("service-{i}"), 80));
        }
    }

    let start = Instant::now();
    handler.on_change(&graph);
    let duration = start.elapsed();

    println!("Recomputed 5000 upstream clusters in {:?}", duration);

    assert_eq!(cache.len(), 5000);
    assert_eq!(cache.stats().updates(), 1);
}
