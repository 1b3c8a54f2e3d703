//! Process configuration for the distribution core.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use xds_cache::{CacheBuilder, CacheConfig};
use xds_core::{Result, TypeUrl, XdsError};

use crate::bootstrap::BootstrapConfig;
use crate::cluster::{ClusterCache, ClusterDefaults, ClusterTranslator};
use crate::handler::GraphChangeHandler;
use crate::model::ClusterGraph;

/// Everything the distribution core reads from its config file.
///
/// Every section is optional; missing sections take their defaults.
///
/// ```rust
/// use xds_graph::DistributionConfig;
///
/// let config = DistributionConfig::from_json(r#"{
///     "cluster_defaults": { "connect_timeout_ms": 500 },
///     "bootstrap": {
///         "clusters": [{ "name": "jaeger", "address": "collector.svc", "port": 9411 }]
///     }
/// }"#).unwrap();
///
/// assert_eq!(config.bootstrap.clusters.len(), 1);
/// assert_eq!(config.cache.initial_capacity, 64);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Cache sizing.
    pub cache: CacheConfig,
    /// Defaults for generated clusters.
    pub cluster_defaults: ClusterDefaults,
    /// Static clusters.
    pub bootstrap: BootstrapConfig,
}

impl DistributionConfig {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| XdsError::configuration(format!("invalid configuration: {e}")))
    }

    /// Read and parse a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            XdsError::configuration(format!("reading {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            bootstrap = config.bootstrap.clusters.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Build the cluster cache sized by this configuration.
    pub fn cluster_cache(&self) -> ClusterCache {
        CacheBuilder::new(TypeUrl::CLUSTER).config(&self.cache).build()
    }

    /// Build the cluster handler, with bootstrap clusters, for `cache`.
    ///
    /// Fails if the bootstrap list is invalid.
    pub fn cluster_handler<G>(
        &self,
        cache: Arc<ClusterCache>,
    ) -> Result<GraphChangeHandler<G, ClusterTranslator>>
    where
        G: ClusterGraph + ?Sized,
    {
        let bootstrap = self.bootstrap.clusters(&self.cluster_defaults)?;
        let translator = ClusterTranslator::new(self.cluster_defaults.clone());
        Ok(GraphChangeHandler::new(cache, translator).with_bootstrap(bootstrap))
    }
}
