//! Registry of the caches a process serves, one per type URL.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use xds_core::{Result, XdsError};

use crate::cache::DiscoveryCache;

/// Thread-safe map from type URL to the cache serving it.
///
/// The composition root registers every cache it builds here, and hands
/// the registry to the discovery server loop. Registering a second cache
/// for the same type URL is rejected, which keeps the one-cache-per-type
/// rule explicit without global state.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use xds_cache::{CacheRegistry, ResourceCache};
/// use xds_core::{AnyResource, TypeUrl};
///
/// let registry = CacheRegistry::new();
/// let clusters = Arc::new(ResourceCache::<AnyResource>::new(TypeUrl::CLUSTER));
///
/// registry.register(clusters.clone()).unwrap();
/// assert!(registry.register(clusters).is_err());
/// assert!(registry.get(TypeUrl::CLUSTER).is_some());
/// ```
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: DashMap<String, Arc<dyn DiscoveryCache>>,
}

impl CacheRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache under its type URL.
    pub fn register(&self, cache: Arc<dyn DiscoveryCache>) -> Result<()> {
        let type_url = cache.type_url().to_string();
        match self.caches.entry(type_url) {
            Entry::Occupied(entry) => Err(XdsError::DuplicateCache {
                type_url: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                debug!(type_url = %entry.key(), "registered resource cache");
                entry.insert(cache);
                Ok(())
            }
        }
    }

    /// Get the cache serving `type_url`.
    #[must_use]
    pub fn get(&self, type_url: &str) -> Option<Arc<dyn DiscoveryCache>> {
        self.caches.get(type_url).map(|r| Arc::clone(r.value()))
    }

    /// Get the cache serving `type_url`, or an error naming it.
    pub fn require(&self, type_url: &str) -> Result<Arc<dyn DiscoveryCache>> {
        self.get(type_url).ok_or_else(|| XdsError::UnknownType {
            type_url: type_url.to_string(),
        })
    }

    /// Check if a cache is registered for `type_url`.
    #[must_use]
    pub fn contains(&self, type_url: &str) -> bool {
        self.caches.contains_key(type_url)
    }

    /// All registered type URLs, sorted.
    #[must_use]
    pub fn type_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.caches.iter().map(|r| r.key().clone()).collect();
        urls.sort();
        urls
    }

    /// Get the number of registered caches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
