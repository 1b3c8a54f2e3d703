//! The per-type resource cache.
//!
//! A [`ResourceCache`] holds the complete set of resources for one type
//! URL. The set is only ever replaced whole, so readers see exactly the
//! argument of some completed [`ResourceCache::update`] and never a mix of
//! two.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tracing::{debug, trace};
use xds_core::{Resource, ResourceVersion, Result, TypeUrl, XdsError};

use crate::notify::{Notifier, Watch};
use crate::ordering;
use crate::stats::CacheStats;

const DEFAULT_CAPACITY: usize = 64;

/// Type-erased view of a resource cache, as a discovery server sees it.
///
/// A server loop holds one `Arc<dyn DiscoveryCache>` per type URL it
/// serves and only ever needs wire-encoded resources and a change signal.
pub trait DiscoveryCache: Send + Sync + fmt::Debug {
    /// The type URL this cache serves.
    fn type_url(&self) -> &TypeUrl;

    /// All resources, sorted by name and encoded.
    fn encoded_contents(&self) -> Result<Vec<prost_types::Any>>;

    /// The requested resources that exist, sorted by name and encoded.
    fn encoded_query(&self, names: &[String]) -> Result<Vec<prost_types::Any>>;

    /// Subscribe to updates.
    fn watch(&self) -> Watch;

    /// Number of resources currently held.
    fn len(&self) -> usize;

    /// Whether the cache holds no resources.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Store of `name -> resource` for a single resource type.
///
/// ## Thread Safety
///
/// All operations take `&self`. The map sits behind a mutex owned by this
/// cache alone, so caches for different types never contend. Readers copy
/// the `Arc`s out under the lock and sort after releasing it.
///
/// ## Notification
///
/// Every [`update`](Self::update) wakes all current waiters, even when the
/// new set equals the old one. Detecting a no-op is left to whoever
/// compares [`CacheSnapshot::version`]s.
pub struct ResourceCache<R: ?Sized> {
    type_url: TypeUrl,
    values: Mutex<HashMap<String, Arc<R>>>,
    notifier: Arc<Notifier>,
    stats: CacheStats,
}

impl<R: Resource + ?Sized> ResourceCache<R> {
    /// Create an empty cache for `type_url`.
    pub fn new(type_url: impl Into<TypeUrl>) -> Self {
        Self::with_capacity(type_url, DEFAULT_CAPACITY)
    }

    /// Create an empty cache with a specific initial capacity.
    pub fn with_capacity(type_url: impl Into<TypeUrl>, capacity: usize) -> Self {
        Self {
            type_url: type_url.into(),
            values: Mutex::new(HashMap::with_capacity(capacity)),
            notifier: Arc::new(Notifier::new()),
            stats: CacheStats::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<R>>> {
        // Writers only ever swap in a complete map, so a poisoned guard
        // still holds a consistent set.
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The type URL this cache serves.
    #[inline]
    pub fn type_url(&self) -> &TypeUrl {
        &self.type_url
    }

    /// Get cache statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// The notifier fired by every update.
    #[inline]
    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    /// Replace the entire contents of the cache and wake all waiters.
    ///
    /// The notification fires while the new map is installed and before the
    /// lock is released, so generation `n` always pairs with the `n`th set.
    pub fn update(&self, resources: HashMap<String, Arc<R>>) {
        let count = resources.len();

        let woken = {
            let mut values = self.lock();
            *values = resources;
            self.notifier.notify()
        };

        self.stats.record_update();
        self.stats.record_woken(woken as u64);

        debug!(
            type_url = %self.type_url,
            resources = count,
            woken,
            "updated resource cache"
        );
    }

    /// All resources, sorted by name.
    ///
    /// Each call returns a fresh `Vec`.
    pub fn contents(&self) -> Vec<Arc<R>> {
        let mut values: Vec<Arc<R>> = self.lock().values().map(Arc::clone).collect();

        ordering::sort_resources(&mut values);
        self.stats.record_read();
        trace!(type_url = %self.type_url, resources = values.len(), "read contents");

        values
    }

    /// The resources named in `names` that the cache holds, sorted by name.
    ///
    /// Names the cache does not hold are omitted. No placeholder is ever
    /// synthesized: a blank resource may lack fields the proxy requires.
    /// A name requested more than once appears once.
    pub fn query<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<R>> {
        let mut values: Vec<Arc<R>> = {
            let current = self.lock();
            names
                .iter()
                .filter_map(|name| current.get(name.as_ref()).map(Arc::clone))
                .collect()
        };

        let omitted = names.len() - values.len();
        ordering::sort_resources(&mut values);
        ordering::dedup_by_name(&mut values);

        self.stats.record_query(omitted as u64);
        trace!(
            type_url = %self.type_url,
            requested = names.len(),
            found = values.len(),
            "queried resources"
        );

        values
    }

    /// Sorted contents together with the generation they were read at.
    pub fn snapshot(&self) -> CacheSnapshot<R> {
        let (generation, mut resources) = {
            let values = self.lock();
            let resources: Vec<Arc<R>> = values.values().map(Arc::clone).collect();
            (self.notifier.generation(), resources)
        };

        ordering::sort_resources(&mut resources);
        self.stats.record_read();

        CacheSnapshot {
            type_url: self.type_url.clone(),
            generation,
            resources,
        }
    }

    /// Subscribe to updates of this cache.
    ///
    /// The returned watch fires on the first update after this call.
    pub fn watch(&self) -> Watch {
        Watch::new(Arc::clone(&self.notifier))
    }

    /// Number of resources currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no resources.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<R: Resource + ?Sized> fmt::Debug for ResourceCache<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("type_url", &self.type_url)
            .field("resources", &self.len())
            .field("generation", &self.notifier.generation())
            .finish()
    }
}

impl<R: Resource + ?Sized> DiscoveryCache for ResourceCache<R> {
    fn type_url(&self) -> &TypeUrl {
        &self.type_url
    }

    fn encoded_contents(&self) -> Result<Vec<prost_types::Any>> {
        encode_all(&self.type_url, &self.contents())
    }

    fn encoded_query(&self, names: &[String]) -> Result<Vec<prost_types::Any>> {
        encode_all(&self.type_url, &self.query(names))
    }

    fn watch(&self) -> Watch {
        ResourceCache::watch(self)
    }

    fn len(&self) -> usize {
        ResourceCache::len(self)
    }
}

/// Encode `resources` for the channel serving `type_url`.
///
/// A resource that encodes under a different type URL cannot be sent on
/// this channel and fails the whole batch.
fn encode_all<R: Resource + ?Sized>(
    type_url: &TypeUrl,
    resources: &[Arc<R>],
) -> Result<Vec<prost_types::Any>> {
    resources
        .iter()
        .map(|resource| {
            let any = resource.encode()?;
            if any.type_url != type_url.as_str() {
                return Err(XdsError::encoding(
                    type_url.as_str(),
                    format!("resource {} encodes as {}", resource.name(), any.type_url),
                ));
            }
            Ok(any)
        })
        .collect()
}

/// A sorted, point-in-time copy of a cache's contents.
#[derive(Debug, Clone)]
pub struct CacheSnapshot<R: ?Sized> {
    type_url: TypeUrl,
    generation: u64,
    resources: Vec<Arc<R>>,
}

impl<R: Resource + ?Sized> CacheSnapshot<R> {
    /// The type URL of the cache this was taken from.
    #[inline]
    pub fn type_url(&self) -> &TypeUrl {
        &self.type_url
    }

    /// The notifier generation the contents were read at.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The resources, sorted by name.
    #[inline]
    pub fn resources(&self) -> &[Arc<R>] {
        &self.resources
    }

    /// Consume and return the resources.
    pub fn into_resources(self) -> Vec<Arc<R>> {
        self.resources
    }

    /// Number of resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the snapshot is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Content digest; equal snapshots always yield equal versions.
    pub fn version(&self) -> Result<ResourceVersion> {
        ResourceVersion::digest(&self.resources)
    }

    /// Encode every resource, in order.
    pub fn encode(&self) -> Result<Vec<prost_types::Any>> {
        encode_all(&self.type_url, &self.resources)
    }
}

/// Cache settings loadable from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Initial capacity of each cache's map.
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Builder for creating a configured cache.
#[derive(Debug)]
pub struct CacheBuilder {
    type_url: TypeUrl,
    capacity: Option<usize>,
}

impl CacheBuilder {
    /// Start building a cache for `type_url`.
    pub fn new(type_url: impl Into<TypeUrl>) -> Self {
        Self {
            type_url: type_url.into(),
            capacity: None,
        }
    }

    /// Apply settings from configuration.
    pub fn config(mut self, config: &CacheConfig) -> Self {
        self.capacity = Some(config.initial_capacity);
        self
    }

    /// Set the initial capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Build the cache.
    pub fn build<R: Resource + ?Sized>(self) -> ResourceCache<R> {
        ResourceCache::with_capacity(self.type_url, self.capacity.unwrap_or(DEFAULT_CAPACITY))
    }
}
