//! # xds-graph
//!
//! Turns configuration-graph changes into published resource sets.
//!
//! - [`GraphChangeHandler`] - Recomputes one resource type per change
//! - [`Translator`] - The per-type walk over the graph
//! - [`Accumulator`] - First-writer-wins set with failure containment
//! - [`ClusterTranslator`] - The cluster (CDS) pipeline
//! - [`DistributionConfig`] - Cache sizing, cluster defaults, bootstrap clusters
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xds_graph::{
//!     ClusterCache, ClusterDefaults, ClusterTranslator, ConfigGraph, GraphChangeHandler,
//!     GraphObserver, StaticClusterConfig, UpstreamCluster,
//! };
//!
//! let cache = Arc::new(ClusterCache::new(xds_core::TypeUrl::CLUSTER));
//! let jaeger = StaticClusterConfig::new("jaeger", "collector.svc", 9411)
//!     .to_cluster(&ClusterDefaults::default())
//!     .unwrap();
//!
//! let handler = GraphChangeHandler::<ConfigGraph, _>::new(cache.clone(), ClusterTranslator::default())
//!     .with_bootstrap([jaeger]);
//!
//! let graph = ConfigGraph::new().with_cluster(UpstreamCluster::new("default", "web", 80));
//! handler.on_change(&graph);
//!
//! assert_eq!(cache.len(), 2);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod accumulator;
mod bootstrap;
mod cluster;
mod config;
mod handler;
mod model;
pub mod naming;

pub use accumulator::Accumulator;
pub use bootstrap::{BootstrapConfig, StaticClusterConfig, StaticDiscovery};
pub use cluster::{ClusterCache, ClusterDefaults, ClusterTranslator};
pub use config::DistributionConfig;
pub use handler::{GraphChangeHandler, GraphObserver, ObserverSet, Translator};
pub use model::{ClusterGraph, ConfigGraph, ExtensionCluster, LoadBalancerPolicy, UpstreamCluster};
