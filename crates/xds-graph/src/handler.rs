//! Graph-change handling.
//!
//! When the configuration graph is rebuilt, every registered
//! [`GraphObserver`] is told about it. A [`GraphChangeHandler`] turns the
//! new graph into a complete resource set for one type and replaces its
//! cache contents in a single update.
//!
//! ## Merge Order
//!
//! 1. Resources from the graph walk, first name wins
//! 2. Resources declared by extension services, if their name is free
//! 3. Bootstrap resources from configuration, if their name is free
//!
//! A resource that fails to translate is omitted and logged; the rest of
//! the set is still published.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info};
use xds_cache::ResourceCache;
use xds_core::Resource;

use crate::accumulator::Accumulator;

/// Translates one resource type out of a graph of type `G`.
pub trait Translator<G: ?Sized>: Send + Sync {
    /// The resource type produced.
    type Resource: Resource;

    /// Walk the graph and insert every derived resource.
    fn walk_graph(&self, graph: &G, acc: &mut Accumulator<Self::Resource>);

    /// Insert resources declared by extension services.
    fn walk_extensions(&self, _graph: &G, _acc: &mut Accumulator<Self::Resource>) {}
}

/// Something told about every rebuilt graph.
pub trait GraphObserver<G: ?Sized>: Send + Sync {
    /// Called with each newly built graph.
    fn on_change(&self, graph: &G);
}

/// Recomputes one resource type per graph change and publishes it.
pub struct GraphChangeHandler<G: ?Sized, T: Translator<G>> {
    cache: Arc<ResourceCache<T::Resource>>,
    translator: T,
    bootstrap: Vec<Arc<T::Resource>>,
    _graph: PhantomData<fn(&G)>,
}

impl<G: ?Sized, T: Translator<G>> GraphChangeHandler<G, T> {
    /// Create a handler publishing into `cache`.
    pub fn new(cache: Arc<ResourceCache<T::Resource>>, translator: T) -> Self {
        Self {
            cache,
            translator,
            bootstrap: Vec::new(),
            _graph: PhantomData,
        }
    }

    /// Add bootstrap resources, merged after the graph on every change.
    pub fn with_bootstrap<I>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = T::Resource>,
    {
        self.bootstrap.extend(resources.into_iter().map(Arc::new));
        self
    }

    /// The cache this handler publishes into.
    #[inline]
    pub fn cache(&self) -> &Arc<ResourceCache<T::Resource>> {
        &self.cache
    }

    /// The translator in use.
    #[inline]
    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Bootstrap resources, in merge order.
    #[inline]
    pub fn bootstrap(&self) -> &[Arc<T::Resource>] {
        &self.bootstrap
    }

    /// Build the full resource set for `graph` without publishing it.
    pub fn recompute(&self, graph: &G) -> HashMap<String, Arc<T::Resource>> {
        let mut acc = Accumulator::new(self.cache.type_url().clone());

        self.translator.walk_graph(graph, &mut acc);
        let from_graph = acc.len();

        self.translator.walk_extensions(graph, &mut acc);
        let from_extensions = acc.len() - from_graph;

        for resource in &self.bootstrap {
            acc.insert_shared(Arc::clone(resource));
        }
        let from_bootstrap = acc.len() - from_graph - from_extensions;

        debug!(
            type_url = %self.cache.type_url(),
            graph = from_graph,
            extensions = from_extensions,
            bootstrap = from_bootstrap,
            duplicates = acc.duplicates(),
            failures = acc.failures(),
            "recomputed resource set"
        );

        acc.into_resources()
    }
}

impl<G: ?Sized, T: Translator<G>> GraphObserver<G> for GraphChangeHandler<G, T> {
    fn on_change(&self, graph: &G) {
        let resources = self.recompute(graph);
        let count = resources.len();
        self.cache.update(resources);
        info!(type_url = %self.cache.type_url(), resources = count, "published graph change");
    }
}

impl<G: ?Sized, T: Translator<G>> fmt::Debug for GraphChangeHandler<G, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphChangeHandler")
            .field("type_url", self.cache.type_url())
            .field("bootstrap", &self.bootstrap.len())
            .finish()
    }
}

/// Fans one graph change out to several observers, in registration order.
pub struct ObserverSet<G: ?Sized> {
    observers: Vec<Arc<dyn GraphObserver<G>>>,
}

impl<G: ?Sized> ObserverSet<G> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Register an observer.
    pub fn add(&mut self, observer: Arc<dyn GraphObserver<G>>) {
        self.observers.push(observer);
    }

    /// Register an observer, builder style.
    pub fn with(mut self, observer: Arc<dyn GraphObserver<G>>) -> Self {
        self.add(observer);
        self
    }

    /// Number of observers.
    #[inline]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<G: ?Sized> Default for ObserverSet<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: ?Sized> GraphObserver<G> for ObserverSet<G> {
    fn on_change(&self, graph: &G) {
        for observer in &self.observers {
            observer.on_change(graph);
        }
    }
}

impl<G: ?Sized> fmt::Debug for ObserverSet<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}
