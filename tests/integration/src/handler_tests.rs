//! Graph-change integration tests.
//!
//! These drive the cluster pipeline end to end: a configuration graph
//! goes in through an observer set, and discovery-side readers watch the
//! registered cluster cache.

use std::sync::Arc;
use std::time::Duration;

use xds_distribution::graph::naming::cluster_name;
use xds_distribution::prelude::*;
use xds_distribution::types::DiscoveryType;

const CONFIG: &str = r#"{
    "cache": { "initial_capacity": 16 },
    "cluster_defaults": { "connect_timeout_ms": 1000 },
    "bootstrap": {
        "clusters": [
            { "name": "jaeger", "address": "gateway-collector.otel-collector.svc", "port": 9411 }
        ]
    }
}"#;

struct Plane {
    clusters: Arc<ClusterCache>,
    registry: CacheRegistry,
    observers: ObserverSet<ConfigGraph>,
}

fn plane() -> Plane {
    let config = DistributionConfig::from_json(CONFIG).expect("valid config");
    let clusters = Arc::new(config.cluster_cache());

    let registry = CacheRegistry::new();
    registry.register(clusters.clone()).expect("register");

    let handler = config
        .cluster_handler::<ConfigGraph>(clusters.clone())
        .expect("valid bootstrap");
    let observers = ObserverSet::new().with(Arc::new(handler) as Arc<dyn GraphObserver<ConfigGraph>>);

    Plane {
        clusters,
        registry,
        observers,
    }
}

fn names(clusters: &ClusterCache) -> Vec<String> {
    clusters.contents().iter().map(|c| c.name.clone()).collect()
}

#[test]
fn graph_change_publishes_full_set() {
    let plane = plane();
    let web = UpstreamCluster::new("default", "web", 80);
    let api = UpstreamCluster::new("default", "api", 8080).with_port_name("http");

    let graph = ConfigGraph::new()
        .with_cluster(web.clone())
        .with_cluster(api.clone())
        .with_extension_cluster(ExtensionCluster::new(
            "extension/projectcontour/authz",
            "projectcontour/authz/9443",
        ));
    plane.observers.on_change(&graph);

    let mut expected = vec![
        cluster_name(&web),
        cluster_name(&api),
        "extension/projectcontour/authz".to_string(),
        "jaeger".to_string(),
    ];
    expected.sort();
    assert_eq!(names(&plane.clusters), expected);
    assert_eq!(plane.clusters.stats().updates(), 1);
}

#[test]
fn duplicate_routes_share_one_cluster() {
    let plane = plane();
    let web = UpstreamCluster::new("default", "web", 80);

    let graph = ConfigGraph::new()
        .with_cluster(web.clone())
        .with_cluster(web.clone())
        .with_cluster(web.clone().with_protocol("h2"));
    plane.observers.on_change(&graph);

    // Two distinct settings for web:80, plus jaeger.
    assert_eq!(plane.clusters.len(), 3);

    let plain = plane.clusters.query(&[cluster_name(&web)]);
    let h2 = plane.clusters.query(&[cluster_name(&web.with_protocol("h2"))]);
    assert!(plain[0].http2_protocol_options.is_none());
    assert!(h2[0].http2_protocol_options.is_some());
    assert!(h2[0].transport_socket.is_some());
}

#[test]
fn graph_and_extension_shadow_bootstrap() {
    let plane = plane();
    let graph = ConfigGraph::new()
        .with_extension_cluster(ExtensionCluster::new("jaeger", "tracing/jaeger/9411"));
    plane.observers.on_change(&graph);

    let jaeger = plane.clusters.query(&["jaeger"]);
    assert_eq!(jaeger.len(), 1);
    assert_eq!(jaeger[0].r#type, DiscoveryType::Eds as i32);
}

#[test]
fn bootstrap_cluster_shape() {
    let plane = plane();
    plane.observers.on_change(&ConfigGraph::new());

    let jaeger = plane.clusters.query(&["jaeger"]);
    let jaeger = jaeger.first().expect("bootstrap cluster published");

    assert_eq!(jaeger.r#type, DiscoveryType::StrictDns as i32);
    assert_eq!(jaeger.connect_timeout.as_ref().map(|d| d.seconds), Some(1));
    let endpoint = jaeger
        .load_assignment
        .as_ref()
        .and_then(|la| la.endpoints.first())
        .and_then(|l| l.lb_endpoints.first())
        .and_then(|e| e.endpoint.as_ref())
        .and_then(|e| e.address.as_ref())
        .and_then(|a| a.socket_address.as_ref())
        .expect("single endpoint");
    assert_eq!(endpoint.address, "gateway-collector.otel-collector.svc");
    assert_eq!(endpoint.port_value, 9411);
}

#[test]
fn broken_entries_are_contained() {
    let plane = plane();
    let good = UpstreamCluster::new("default", "web", 80);

    let graph = ConfigGraph::new()
        .with_cluster(UpstreamCluster::new("default", "broken", 0))
        .with_cluster(good.clone())
        .with_extension_cluster(ExtensionCluster::new("extension/empty", ""));
    plane.observers.on_change(&graph);

    let mut expected = vec![cluster_name(&good), "jaeger".to_string()];
    expected.sort();
    assert_eq!(names(&plane.clusters), expected);
}

#[test]
fn removed_service_disappears_on_next_change() {
    let plane = plane();
    let mut graph = ConfigGraph::new()
        .with_cluster(UpstreamCluster::new("default", "web", 80))
        .with_cluster(UpstreamCluster::new("default", "api", 80));
    plane.observers.on_change(&graph);
    assert_eq!(plane.clusters.len(), 3);

    graph.remove_service("default", "web");
    plane.observers.on_change(&graph);

    assert_eq!(plane.clusters.len(), 2);
    assert!(names(&plane.clusters).iter().all(|n| !n.starts_with("default/web/")));
}

#[test]
fn repeated_identical_graph_is_stable() {
    let plane = plane();
    let graph = ConfigGraph::new()
        .with_cluster(UpstreamCluster::new("default", "web", 80))
        .with_cluster(UpstreamCluster::new("default", "api", 80));

    plane.observers.on_change(&graph);
    let first = plane.clusters.snapshot();
    plane.observers.on_change(&graph);
    let second = plane.clusters.snapshot();

    assert_eq!(second.generation(), first.generation() + 1);
    assert_eq!(
        first.version().expect("version"),
        second.version().expect("version")
    );
}

#[tokio::test]
async fn discovery_reader_sees_each_change() {
    let plane = plane();
    let served = plane.registry.require(TypeUrl::CLUSTER).expect("registered");
    let mut watch = served.watch();

    let observers = plane.observers;
    let producer = tokio::spawn(async move {
        for port in [80u16, 81, 82] {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let graph = ConfigGraph::new().with_cluster(UpstreamCluster::new("default", "web", port));
            observers.on_change(&graph);
        }
    });

    let mut last = 0;
    while last < 3 {
        last = tokio::time::timeout(Duration::from_secs(5), watch.changed())
            .await
            .expect("reader should be woken");
        let contents = served.encoded_contents().expect("encode");
        assert_eq!(contents.len(), 2);
    }

    producer.await.expect("Task panicked");
    assert_eq!(plane.clusters.notifier().generation(), 3);
}

#[tokio::test]
async fn reader_cancellation_does_not_block_producer() {
    let plane = plane();
    let mut watch = plane.clusters.watch();

    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let reader = tokio::spawn(async move { watch.changed_or_cancel(stopped).await });

    tokio::task::yield_now().await;
    drop(stop);

    assert_eq!(reader.await.expect("Task panicked"), None);

    plane.observers.on_change(&ConfigGraph::new());
    assert_eq!(plane.clusters.len(), 1);
}
