//! Cluster pipeline: graph clusters to wire `Cluster` resources.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;
use xds_cache::ResourceCache;
use xds_core::{Result, TypeUrl, XdsError};
use xds_types::{
    Cluster, ClusterLoadAssignment, CommonTlsContext, DiscoveryType, EdsClusterConfig, HealthCheck,
    Http2ProtocolOptions, HttpHealthCheck, TransportSocket, UpstreamTlsContext,
};

use crate::accumulator::Accumulator;
use crate::handler::Translator;
use crate::model::{ClusterGraph, ExtensionCluster, LoadBalancerPolicy, UpstreamCluster};
use crate::naming::cluster_name;

/// The cache that serves CDS.
pub type ClusterCache = ResourceCache<Cluster>;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);
const UNHEALTHY_THRESHOLD: u32 = 3;
const HEALTHY_THRESHOLD: u32 = 2;

/// Settings applied to every generated cluster unless overridden.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClusterDefaults {
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl ClusterDefaults {
    /// The default connect timeout.
    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ClusterDefaults {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2_000,
        }
    }
}

/// Convert a timeout to the wire duration, saturating on overflow.
pub(crate) fn wire_duration(timeout: Duration) -> prost_types::Duration {
    prost_types::Duration {
        seconds: i64::try_from(timeout.as_secs()).unwrap_or(i64::MAX),
        nanos: timeout.subsec_nanos() as i32,
    }
}

/// Base cluster shared by every translation path.
pub(crate) fn base_cluster(
    name: &str,
    policy: LoadBalancerPolicy,
    timeout: Duration,
) -> Cluster {
    Cluster {
        name: name.to_string(),
        lb_policy: policy.to_wire() as i32,
        connect_timeout: Some(wire_duration(timeout)),
        ..Default::default()
    }
}

/// Apply the upstream protocol and SNI to `cluster`.
///
/// `h2c` enables HTTP/2 in cleartext, `h2` enables HTTP/2 over TLS with
/// ALPN `h2`, and `tls` enables TLS alone. Unset or empty means plain
/// HTTP/1. An SNI is only accepted together with TLS.
fn apply_protocol(
    cluster: &mut Cluster,
    protocol: Option<&str>,
    sni: Option<&str>,
) -> Result<()> {
    let (http2, tls) = match protocol.unwrap_or_default() {
        "" => (false, false),
        "h2c" => (true, false),
        "h2" => (true, true),
        "tls" => (false, true),
        other => {
            return Err(XdsError::translation(
                TypeUrl::CLUSTER,
                &cluster.name,
                format!("unsupported upstream protocol {other:?}"),
            ));
        }
    };

    let sni = sni.unwrap_or_default();
    if !sni.is_empty() && !tls {
        return Err(XdsError::translation(
            TypeUrl::CLUSTER,
            &cluster.name,
            "SNI requires the h2 or tls protocol",
        ));
    }

    if http2 {
        cluster.http2_protocol_options = Some(Http2ProtocolOptions::default());
    }
    if tls {
        let alpn_protocols = if http2 { vec!["h2".to_string()] } else { Vec::new() };
        cluster.transport_socket = Some(TransportSocket::upstream_tls(&UpstreamTlsContext {
            common_tls_context: Some(CommonTlsContext { alpn_protocols }),
            sni: sni.to_string(),
        }));
    }
    Ok(())
}

/// An HTTP health check of `path`.
fn http_health_check(path: &str) -> HealthCheck {
    HealthCheck {
        timeout: Some(wire_duration(HEALTH_CHECK_TIMEOUT)),
        interval: Some(wire_duration(HEALTH_CHECK_INTERVAL)),
        unhealthy_threshold: Some(UNHEALTHY_THRESHOLD),
        healthy_threshold: Some(HEALTHY_THRESHOLD),
        http_health_check: Some(HttpHealthCheck {
            host: String::new(),
            path: path.to_string(),
        }),
    }
}

/// Translates the clusters of a [`ClusterGraph`].
///
/// Graph clusters are named with [`cluster_name`] and discovered through
/// EDS, or through DNS when the upstream carries an external name.
/// Extension clusters keep their declared names.
#[derive(Debug, Clone, Default)]
pub struct ClusterTranslator {
    defaults: ClusterDefaults,
}

impl ClusterTranslator {
    /// Create a translator with the given defaults.
    pub fn new(defaults: ClusterDefaults) -> Self {
        Self { defaults }
    }

    /// The defaults in use.
    #[inline]
    pub fn defaults(&self) -> &ClusterDefaults {
        &self.defaults
    }

    /// Translate one graph cluster published as `name`.
    pub fn translate_upstream(&self, name: &str, upstream: &UpstreamCluster) -> Result<Cluster> {
        if upstream.service.is_empty() {
            return Err(XdsError::translation(
                TypeUrl::CLUSTER,
                name,
                "upstream service name is empty",
            ));
        }
        if upstream.port == 0 {
            return Err(XdsError::translation(
                TypeUrl::CLUSTER,
                name,
                "upstream port is zero",
            ));
        }

        let timeout = upstream
            .connect_timeout
            .unwrap_or_else(|| self.defaults.connect_timeout());
        let mut cluster = base_cluster(name, upstream.lb_policy, timeout);
        cluster.alt_stat_name = format!(
            "{}_{}_{}",
            upstream.namespace, upstream.service, upstream.port
        );
        apply_protocol(&mut cluster, upstream.protocol.as_deref(), upstream.sni.as_deref())?;
        if let Some(path) = upstream.health_check_path.as_deref().filter(|p| !p.is_empty()) {
            cluster.health_checks.push(http_health_check(path));
        }

        match upstream.external_name.as_deref() {
            Some("") => {
                return Err(XdsError::translation(
                    TypeUrl::CLUSTER,
                    name,
                    "external name is empty",
                ));
            }
            Some(host) => {
                cluster.r#type = DiscoveryType::StrictDns as i32;
                cluster.load_assignment = Some(ClusterLoadAssignment::single_endpoint(
                    name,
                    host,
                    u32::from(upstream.port),
                ));
            }
            None => {
                cluster.r#type = DiscoveryType::Eds as i32;
                cluster.eds_cluster_config = Some(EdsClusterConfig {
                    service_name: upstream.eds_service_name(),
                });
            }
        }

        Ok(cluster)
    }

    /// Translate one extension cluster.
    pub fn translate_extension(&self, extension: &ExtensionCluster) -> Result<Cluster> {
        if extension.upstream.is_empty() {
            return Err(XdsError::translation(
                TypeUrl::CLUSTER,
                &extension.name,
                "extension cluster has no upstream",
            ));
        }

        let timeout = extension
            .connect_timeout
            .unwrap_or_else(|| self.defaults.connect_timeout());
        let mut cluster = base_cluster(&extension.name, extension.lb_policy, timeout);
        cluster.r#type = DiscoveryType::Eds as i32;
        cluster.alt_stat_name = extension.name.replace('/', "_");
        cluster.eds_cluster_config = Some(EdsClusterConfig {
            service_name: extension.upstream.clone(),
        });
        apply_protocol(&mut cluster, extension.protocol.as_deref(), extension.sni.as_deref())?;
        Ok(cluster)
    }
}

impl<G: ClusterGraph + ?Sized> Translator<G> for ClusterTranslator {
    type Resource = Cluster;

    fn walk_graph(&self, graph: &G, acc: &mut Accumulator<Cluster>) {
        for upstream in graph.clusters() {
            let name = cluster_name(upstream);
            acc.insert_with(&name, || self.translate_upstream(&name, upstream));
        }
    }

    fn walk_extensions(&self, graph: &G, acc: &mut Accumulator<Cluster>) {
        for extension in graph.extension_clusters() {
            if extension.name.is_empty() {
                warn!(upstream = %extension.upstream, "omitting extension cluster with no name");
                continue;
            }
            acc.insert_with(&extension.name, || self.translate_extension(extension));
        }
    }
}
