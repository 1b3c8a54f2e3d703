//! Collects a resource set during recomputation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};
use xds_core::{Resource, Result, TypeUrl};

/// A `name -> resource` set under construction.
///
/// The first resource inserted under a name wins; later candidates for
/// that name are skipped without being translated. A translation that
/// fails is logged and left out, so one bad graph entry never keeps the
/// rest of the set from being published.
pub struct Accumulator<R> {
    type_url: TypeUrl,
    resources: HashMap<String, Arc<R>>,
    duplicates: usize,
    failures: usize,
}

impl<R: Resource> Accumulator<R> {
    /// Create an empty accumulator for `type_url`.
    pub fn new(type_url: impl Into<TypeUrl>) -> Self {
        Self {
            type_url: type_url.into(),
            resources: HashMap::new(),
            duplicates: 0,
            failures: 0,
        }
    }

    /// Whether a resource is already held under `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Insert the result of `translate` under `name`, unless `name` is taken.
    ///
    /// `translate` only runs when the name is free. Returns whether a
    /// resource was inserted.
    pub fn insert_with<F>(&mut self, name: &str, translate: F) -> bool
    where
        F: FnOnce() -> Result<R>,
    {
        if self.contains(name) {
            self.duplicates += 1;
            trace!(type_url = %self.type_url, name, "name already present, keeping first");
            return false;
        }

        match translate() {
            Ok(resource) if resource.name() == name => {
                self.resources.insert(name.to_string(), Arc::new(resource));
                true
            }
            Ok(resource) => {
                self.failures += 1;
                warn!(
                    type_url = %self.type_url,
                    name,
                    translated = resource.name(),
                    "omitting resource whose name does not match its key"
                );
                false
            }
            Err(error) => {
                self.failures += 1;
                warn!(
                    type_url = %self.type_url,
                    name,
                    %error,
                    "omitting resource that failed translation"
                );
                false
            }
        }
    }

    /// Insert an already-built resource under its own name, unless taken.
    pub fn insert_shared(&mut self, resource: Arc<R>) -> bool {
        if self.contains(resource.name()) {
            self.duplicates += 1;
            trace!(type_url = %self.type_url, name = resource.name(), "name already present, keeping first");
            return false;
        }
        self.resources.insert(resource.name().to_string(), resource);
        true
    }

    /// Number of resources collected.
    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing has been collected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Candidates skipped because their name was already taken.
    #[inline]
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Candidates left out because translation failed.
    #[inline]
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Finish and return the collected set.
    pub fn into_resources(self) -> HashMap<String, Arc<R>> {
        self.resources
    }
}

impl<R> fmt::Debug for Accumulator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("type_url", &self.type_url)
            .field("resources", &self.resources.len())
            .field("duplicates", &self.duplicates)
            .field("failures", &self.failures)
            .finish()
    }
}
