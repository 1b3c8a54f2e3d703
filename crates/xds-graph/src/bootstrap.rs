//! Static clusters that are always published.
//!
//! Bootstrap clusters come from configuration, not from the graph. They are
//! merged last, so a graph or extension cluster with the same name takes
//! precedence.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use xds_core::{Result, XdsError};
use xds_types::{Cluster, ClusterLoadAssignment, DiscoveryType};

use crate::cluster::{base_cluster, ClusterDefaults};
use crate::model::LoadBalancerPolicy;

/// How a static cluster resolves its address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticDiscovery {
    /// Resolve every DNS answer and balance across all of them.
    #[default]
    StrictDns,
    /// Resolve DNS and connect to the first answer.
    LogicalDns,
    /// The address is a literal IP.
    Static,
}

impl StaticDiscovery {
    fn to_wire(self) -> DiscoveryType {
        match self {
            Self::StrictDns => DiscoveryType::StrictDns,
            Self::LogicalDns => DiscoveryType::LogicalDns,
            Self::Static => DiscoveryType::Static,
        }
    }
}

/// One static cluster, such as a tracing collector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticClusterConfig {
    /// Cluster name as published.
    pub name: String,
    /// Host name or IP of the single endpoint.
    pub address: String,
    /// Port of the single endpoint.
    pub port: u16,
    /// Load balancing policy.
    #[serde(default)]
    pub lb_policy: LoadBalancerPolicy,
    /// Address resolution.
    #[serde(default)]
    pub discovery: StaticDiscovery,
    /// Overrides the default connect timeout, in milliseconds.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl StaticClusterConfig {
    /// Create a strict-DNS, round-robin cluster for `address:port`.
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            lb_policy: LoadBalancerPolicy::default(),
            discovery: StaticDiscovery::default(),
            connect_timeout_ms: None,
        }
    }

    /// Check the entry, then build the wire cluster.
    pub fn to_cluster(&self, defaults: &ClusterDefaults) -> Result<Cluster> {
        if self.name.is_empty() {
            return Err(XdsError::configuration("static cluster has an empty name"));
        }
        if self.address.is_empty() {
            return Err(XdsError::configuration(format!(
                "static cluster {} has an empty address",
                self.name
            )));
        }
        if self.port == 0 {
            return Err(XdsError::configuration(format!(
                "static cluster {} has port 0",
                self.name
            )));
        }

        let timeout = self
            .connect_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| defaults.connect_timeout());
        let mut cluster = base_cluster(&self.name, self.lb_policy, timeout);
        cluster.r#type = self.discovery.to_wire() as i32;
        cluster.load_assignment = Some(ClusterLoadAssignment::single_endpoint(
            &self.name,
            &self.address,
            u32::from(self.port),
        ));
        Ok(cluster)
    }
}

/// The static cluster list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Static clusters, published whenever their name is free.
    pub clusters: Vec<StaticClusterConfig>,
}

impl BootstrapConfig {
    /// Build every static cluster.
    ///
    /// Fails on the first invalid entry or on a repeated name; a bad
    /// bootstrap list is a startup error.
    pub fn clusters(&self, defaults: &ClusterDefaults) -> Result<Vec<Cluster>> {
        let mut seen = HashSet::new();
        self.clusters
            .iter()
            .map(|entry| {
                if !seen.insert(entry.name.as_str()) {
                    return Err(XdsError::configuration(format!(
                        "static cluster {} is declared twice",
                        entry.name
                    )));
                }
                entry.to_cluster(defaults)
            })
            .collect()
    }
}
