//! # xds-cache
//!
//! Per-type resource caches for an xDS control plane.
//!
//! This crate provides the distribution core that sits between the
//! configuration producer and the discovery server loop:
//!
//! - [`ResourceCache`] - Whole-set store for one resource type
//! - [`Notifier`] / [`Watch`] - Broadcast wakeup on every update
//! - [`ordering`] - Deterministic name order for snapshots
//! - [`CacheRegistry`] - One cache per type URL, shared as [`DiscoveryCache`]
//!
//! ## Key Design Decisions
//!
//! - Each cache has its own lock; different types never block each other
//! - Updates replace the whole map, so readers never see a partial set
//! - Readers copy `Arc`s out under the lock and sort outside it
//! - Waiting never touches the data lock
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use xds_cache::ResourceCache;
//! use xds_core::{AnyResource, Resource, TypeUrl};
//!
//! let cache = ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER);
//!
//! let web = Arc::new(AnyResource::from_bytes(TypeUrl::CLUSTER, "web", vec![]));
//! cache.update(HashMap::from([("web".to_string(), web)]));
//!
//! assert_eq!(cache.contents()[0].name(), "web");
//! assert!(cache.query(&["missing"]).is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod notify;
pub mod ordering;
mod registry;
mod stats;

pub use cache::{CacheBuilder, CacheConfig, CacheSnapshot, DiscoveryCache, ResourceCache};
pub use notify::{Notifier, Watch};
pub use registry::CacheRegistry;
pub use stats::CacheStats;
