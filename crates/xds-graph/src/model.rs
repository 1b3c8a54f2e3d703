//! Graph-side view of upstream clusters.
//!
//! The configuration graph itself is owned by the producer. This module
//! describes what the cluster pipeline needs to read from it:
//!
//! - [`UpstreamCluster`] - A service port reached through the graph walk
//! - [`ExtensionCluster`] - A cluster declared by an extension service
//! - [`ClusterGraph`] - Read access to both, in walk order
//! - [`ConfigGraph`] - A plain in-memory graph for tests and demos

use std::time::Duration;

use serde::Deserialize;
use xds_types::LbPolicy;

/// Load balancing policy requested for a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerPolicy {
    /// Weighted round robin.
    #[default]
    RoundRobin,
    /// Least outstanding requests.
    LeastRequest,
    /// Uniformly random.
    Random,
    /// Consistent hashing over a ring.
    RingHash,
    /// Maglev consistent hashing.
    Maglev,
}

impl LoadBalancerPolicy {
    /// Stable lowercase name, also used when hashing cluster names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::LeastRequest => "least_request",
            Self::Random => "random",
            Self::RingHash => "ring_hash",
            Self::Maglev => "maglev",
        }
    }

    /// The wire enum value.
    pub fn to_wire(self) -> LbPolicy {
        match self {
            Self::RoundRobin => LbPolicy::RoundRobin,
            Self::LeastRequest => LbPolicy::LeastRequest,
            Self::Random => LbPolicy::Random,
            Self::RingHash => LbPolicy::RingHash,
            Self::Maglev => LbPolicy::Maglev,
        }
    }
}

/// A service port that routes in the graph send traffic to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamCluster {
    /// Namespace of the backing service.
    pub namespace: String,
    /// Name of the backing service.
    pub service: String,
    /// Service port number.
    pub port: u16,
    /// Service port name, if the port is named.
    pub port_name: Option<String>,
    /// Upstream protocol: `h2c`, `h2` or `tls`. Plain HTTP/1 when unset.
    pub protocol: Option<String>,
    /// SNI to present; requires `h2` or `tls`.
    pub sni: Option<String>,
    /// Requested load balancing policy.
    pub lb_policy: LoadBalancerPolicy,
    /// HTTP health check path, if health checking is requested.
    pub health_check_path: Option<String>,
    /// DNS name for services that point outside the cluster.
    pub external_name: Option<String>,
    /// Overrides the default connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl UpstreamCluster {
    /// Create an upstream for `namespace/service:port` with defaults.
    pub fn new(namespace: impl Into<String>, service: impl Into<String>, port: u16) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
            port,
            port_name: None,
            protocol: None,
            sni: None,
            lb_policy: LoadBalancerPolicy::default(),
            health_check_path: None,
            external_name: None,
            connect_timeout: None,
        }
    }

    /// Set the port name.
    pub fn with_port_name(mut self, name: impl Into<String>) -> Self {
        self.port_name = Some(name.into());
        self
    }

    /// Set the upstream protocol.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the SNI.
    pub fn with_sni(mut self, sni: impl Into<String>) -> Self {
        self.sni = Some(sni.into());
        self
    }

    /// Set the load balancing policy.
    pub fn with_lb_policy(mut self, policy: LoadBalancerPolicy) -> Self {
        self.lb_policy = policy;
        self
    }

    /// Set the health check path.
    pub fn with_health_check_path(mut self, path: impl Into<String>) -> Self {
        self.health_check_path = Some(path.into());
        self
    }

    /// Resolve through DNS at `host` instead of endpoint discovery.
    pub fn with_external_name(mut self, host: impl Into<String>) -> Self {
        self.external_name = Some(host.into());
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// The endpoint-discovery service name: `namespace/service/port`.
    ///
    /// Uses the port name when there is one.
    pub fn eds_service_name(&self) -> String {
        match &self.port_name {
            Some(name) if !name.is_empty() => {
                format!("{}/{}/{}", self.namespace, self.service, name)
            }
            _ => format!("{}/{}/{}", self.namespace, self.service, self.port),
        }
    }
}

/// A cluster declared by an extension service rather than by a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionCluster {
    /// Cluster name as published.
    pub name: String,
    /// Endpoint-discovery service name feeding this cluster.
    pub upstream: String,
    /// Upstream protocol, as for [`UpstreamCluster::protocol`].
    pub protocol: Option<String>,
    /// SNI to present; requires `h2` or `tls`.
    pub sni: Option<String>,
    /// Requested load balancing policy.
    pub lb_policy: LoadBalancerPolicy,
    /// Overrides the default connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl ExtensionCluster {
    /// Create an extension cluster fed by `upstream`.
    pub fn new(name: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upstream: upstream.into(),
            protocol: None,
            sni: None,
            lb_policy: LoadBalancerPolicy::default(),
            connect_timeout: None,
        }
    }

    /// Set the upstream protocol.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the SNI.
    pub fn with_sni(mut self, sni: impl Into<String>) -> Self {
        self.sni = Some(sni.into());
        self
    }

    /// Set the load balancing policy.
    pub fn with_lb_policy(mut self, policy: LoadBalancerPolicy) -> Self {
        self.lb_policy = policy;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// Read access to the clusters of a configuration graph.
///
/// Both iterators must yield in a stable order for a given graph value;
/// when two entries map to the same cluster name the first one yielded
/// is published.
pub trait ClusterGraph {
    /// Upstream clusters reached from routes, in walk order.
    fn clusters(&self) -> Box<dyn Iterator<Item = &UpstreamCluster> + '_>;

    /// Clusters declared by extension services, in declaration order.
    fn extension_clusters(&self) -> Box<dyn Iterator<Item = &ExtensionCluster> + '_>;
}

/// An in-memory [`ClusterGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigGraph {
    clusters: Vec<UpstreamCluster>,
    extension_clusters: Vec<ExtensionCluster>,
}

impl ConfigGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an upstream cluster at the end of the walk order.
    pub fn with_cluster(mut self, cluster: UpstreamCluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Add an extension cluster at the end of the declaration order.
    pub fn with_extension_cluster(mut self, cluster: ExtensionCluster) -> Self {
        self.extension_clusters.push(cluster);
        self
    }

    /// Add an upstream cluster in place.
    pub fn push_cluster(&mut self, cluster: UpstreamCluster) {
        self.clusters.push(cluster);
    }

    /// Add an extension cluster in place.
    pub fn push_extension_cluster(&mut self, cluster: ExtensionCluster) {
        self.extension_clusters.push(cluster);
    }

    /// Remove every upstream whose service is `namespace/service`.
    pub fn remove_service(&mut self, namespace: &str, service: &str) {
        self.clusters
            .retain(|c| !(c.namespace == namespace && c.service == service));
    }
}

impl ClusterGraph for ConfigGraph {
    fn clusters(&self) -> Box<dyn Iterator<Item = &UpstreamCluster> + '_> {
        Box::new(self.clusters.iter())
    }

    fn extension_clusters(&self) -> Box<dyn Iterator<Item = &ExtensionCluster> + '_> {
        Box::new(self.extension_clusters.iter())
    }
}
