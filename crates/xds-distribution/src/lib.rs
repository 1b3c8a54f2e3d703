//! # xds-distribution
//!
//! Resource caches and change notification for an xDS control plane.
//!
//! This crate sits between the configuration producer and the discovery
//! server loop. The producer builds a configuration graph; every time it
//! changes, one handler per resource type recomputes the complete set of
//! resources for that type and replaces the cache contents. Discovery
//! streams park on the cache's notifier and read a deterministic, sorted
//! snapshot when woken.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use xds_distribution::prelude::*;
//!
//! let config = DistributionConfig::from_json(r#"{
//!     "bootstrap": {
//!         "clusters": [{ "name": "jaeger", "address": "collector.svc", "port": 9411 }]
//!     }
//! }"#)?;
//!
//! let clusters = Arc::new(config.cluster_cache());
//! let registry = CacheRegistry::new();
//! registry.register(clusters.clone())?;
//!
//! let handler = config.cluster_handler::<ConfigGraph>(clusters.clone())?;
//! let observers = ObserverSet::<ConfigGraph>::new().with(Arc::new(handler));
//!
//! let graph = ConfigGraph::new().with_cluster(UpstreamCluster::new("default", "web", 80));
//! observers.on_change(&graph);
//!
//! let served = registry.require(TypeUrl::CLUSTER)?;
//! assert_eq!(served.encoded_contents()?.len(), 2);
//! # Ok::<(), XdsError>(())
//! ```
//!
//! ## Architecture
//!
//! This library is organized into several crates:
//!
//! - `xds-core` - Resource trait, type URLs, versions, errors
//! - `xds-types` - Wire messages for the cluster pipeline
//! - `xds-cache` - Per-type caches, notifier, deterministic ordering
//! - `xds-graph` - Graph-change handlers and the cluster translator
//!
//! This crate re-exports all public APIs for convenience.
//!
//! ## Design Principles
//!
//! 1. **No panics in library code** - All errors are returned as `Result`
//! 2. **Whole-set replacement** - Readers never observe a partial update
//! 3. **No lost wakeups** - Waiters compare generations, not edges
//! 4. **Contained failures** - A bad graph entry is omitted, not fatal

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export all sub-crates
pub use xds_cache as cache;
pub use xds_core as core;
pub use xds_graph as graph;
pub use xds_types as types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use xds_distribution::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use xds_core::{
        AnyResource, BoxResource, Resource, ResourceVersion, TypeUrl, XdsError,
    };

    // Cache types
    pub use xds_cache::{
        CacheBuilder, CacheConfig, CacheRegistry, CacheSnapshot, CacheStats, DiscoveryCache,
        Notifier, ResourceCache, Watch,
    };

    // Graph types
    pub use xds_graph::{
        Accumulator, BootstrapConfig, ClusterCache, ClusterDefaults, ClusterGraph,
        ClusterTranslator, ConfigGraph, DistributionConfig, ExtensionCluster, GraphChangeHandler,
        GraphObserver, LoadBalancerPolicy, ObserverSet, StaticClusterConfig, Translator,
        UpstreamCluster,
    };

    // Wire types
    pub use xds_types::Cluster;
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("xds-distribution {} (MSRV {})", VERSION, MSRV)
    }
}
