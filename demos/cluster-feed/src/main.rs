//! Cluster Feed Demo
//!
//! Wires the distribution core the way a control plane would, without the
//! gRPC layer:
//!
//! ```text
//! graph producer ──▶ ObserverSet ──▶ GraphChangeHandler ──▶ ClusterCache
//!                                                               │
//!                                    discovery stream ◀── Watch ┘
//! ```
//!
//! The producer rebuilds a small graph on a timer, adding and removing
//! services. A simulated discovery stream parks on the cluster cache and
//! reads the sorted, encoded cluster list each time it is woken.
//!
//! ## Running
//!
//! ```bash
//! cargo run -p cluster-feed -- --services 4 --rounds 10
//! cargo run -p cluster-feed -- --config demos/cluster-feed/config.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use xds_distribution::prelude::*;

/// Feed a changing graph through the cluster pipeline
#[derive(Parser, Debug)]
#[command(name = "cluster-feed")]
#[command(about = "Drive the cluster cache from a changing graph", long_about = None)]
struct Args {
    /// JSON configuration file (cache sizing, cluster defaults, bootstrap clusters)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of services in the rotating graph
    #[arg(short, long, default_value_t = 3)]
    services: u16,

    /// Delay between graph changes, in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Stop after this many graph changes (0 runs until Ctrl+C)
    #[arg(short, long, default_value_t = 0)]
    rounds: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .init();

    info!("{}", xds_distribution::version::version_string());

    let config = match &args.config {
        Some(path) => DistributionConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DistributionConfig::default(),
    };

    // Composition root: one cache per type, registered once.
    let clusters = Arc::new(config.cluster_cache());
    let registry = CacheRegistry::new();
    registry.register(clusters.clone())?;

    let handler = config
        .cluster_handler::<ConfigGraph>(clusters.clone())
        .context("building cluster handler")?;
    info!(
        bootstrap = handler.bootstrap().len(),
        "cluster handler ready"
    );
    let observers = ObserverSet::<ConfigGraph>::new().with(Arc::new(handler));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let served = registry.require(TypeUrl::CLUSTER)?;
    let stream = tokio::spawn(follow(served, shutdown_rx));

    let mut interval = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut round = 0u64;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let graph = build_graph(args.services, round);
                observers.on_change(&graph);
                round += 1;
                if args.rounds != 0 && round >= args.rounds {
                    info!(rounds = round, "finished");
                    break;
                }
            }
            result = signal::ctrl_c() => {
                result.context("waiting for Ctrl+C")?;
                info!("Shutting down gracefully...");
                break;
            }
        }
    }

    // Give the stream a moment to observe the last change.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = shutdown_tx.send(true);
    let woken = stream.await.context("discovery stream panicked")?;

    let stats = clusters.stats();
    info!(
        updates = stats.updates(),
        reads = stats.content_reads(),
        woken,
        "cache stats"
    );

    Ok(())
}

/// Simulated discovery stream: wait, read a sorted snapshot, repeat.
///
/// Returns how many times it was woken.
async fn follow(cache: Arc<dyn DiscoveryCache>, mut shutdown: watch::Receiver<bool>) -> u64 {
    let mut subscription = cache.watch();
    let mut woken = 0;

    while let Some(generation) = subscription.changed_or_cancel(shutdown.changed()).await {
        woken += 1;
        match cache.encoded_contents() {
            Ok(resources) => {
                info!(
                    generation,
                    type_url = %cache.type_url(),
                    resources = resources.len(),
                    "stream woken"
                );
                for resource in &resources {
                    debug!(type_url = %resource.type_url, bytes = resource.value.len(), "resource");
                }
            }
            Err(error) => warn!(%error, "failed to encode cache contents"),
        }
    }

    woken
}

/// A graph whose membership rotates with `round`.
///
/// One service drops out each round and returns the next, and every
/// service is routed twice so the first-writer rule is exercised.
fn build_graph(services: u16, round: u64) -> ConfigGraph {
    let mut graph = ConfigGraph::new();
    let skipped = if services == 0 {
        None
    } else {
        Some(round % u64::from(services))
    };

    for i in 0..services {
        if Some(u64::from(i)) == skipped {
            continue;
        }
        let upstream = UpstreamCluster::new("demo", format!("service-{i}"), 8080)
            .with_port_name("http");
        graph.push_cluster(upstream.clone());
        graph.push_cluster(upstream);
    }

    graph.push_extension_cluster(ExtensionCluster::new(
        "extension/demo/ratelimit",
        "demo/ratelimit/8081",
    ));
    graph
}
