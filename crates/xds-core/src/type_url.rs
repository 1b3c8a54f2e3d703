//! Type URLs: the identifier of each discovery channel.

use std::fmt;

use crate::{Result, XdsError};

const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Type URL wrapper for xDS resource types.
///
/// Every resource cache serves exactly one type URL, and a process holds
/// at most one cache per type URL.
///
/// # Example
///
/// ```rust
/// use xds_core::TypeUrl;
///
/// let cluster_type = TypeUrl::new("type.googleapis.com/envoy.config.cluster.v3.Cluster");
/// assert_eq!(cluster_type.short_name(), "Cluster");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeUrl(String);

impl TypeUrl {
    /// Type URL for Cluster (CDS).
    pub const CLUSTER: &'static str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";

    /// Type URL for ClusterLoadAssignment (EDS).
    pub const ENDPOINT: &'static str =
        "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment";

    /// Type URL for Listener (LDS).
    pub const LISTENER: &'static str = "type.googleapis.com/envoy.config.listener.v3.Listener";

    /// Type URL for RouteConfiguration (RDS).
    pub const ROUTE: &'static str =
        "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";

    /// Type URL for Secret (SDS).
    pub const SECRET: &'static str =
        "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.Secret";

    /// Type URL for Runtime (RTDS).
    pub const RUNTIME: &'static str = "type.googleapis.com/envoy.service.runtime.v3.Runtime";

    /// Create a new type URL from a string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Create a type URL, rejecting strings without the
    /// `type.googleapis.com/` prefix or without a message name.
    pub fn parse(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        match url.strip_prefix(TYPE_URL_PREFIX) {
            Some(message) if !message.is_empty() => Ok(Self(url)),
            Some(_) => Err(XdsError::InvalidTypeUrl {
                type_url: url,
                reason: "missing message name".to_string(),
            }),
            None => Err(XdsError::InvalidTypeUrl {
                type_url: url,
                reason: format!("expected prefix {TYPE_URL_PREFIX}"),
            }),
        }
    }

    /// Get the type URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the short name from the type URL.
    ///
    /// For example, `type.googleapis.com/envoy.config.cluster.v3.Cluster`
    /// returns `Cluster`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0
            .rsplit('/')
            .next()
            .and_then(|s| s.rsplit('.').next())
            .unwrap_or(&self.0)
    }

    /// The discovery service abbreviation for well-known types, e.g. `CDS`.
    #[must_use]
    pub fn service_name(&self) -> Option<&'static str> {
        match self.0.as_str() {
            Self::CLUSTER => Some("CDS"),
            Self::ENDPOINT => Some("EDS"),
            Self::LISTENER => Some("LDS"),
            Self::ROUTE => Some("RDS"),
            Self::SECRET => Some("SDS"),
            Self::RUNTIME => Some("RTDS"),
            _ => None,
        }
    }

    /// Check if this is a valid xDS type URL.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0
            .strip_prefix(TYPE_URL_PREFIX)
            .is_some_and(|message| !message.is_empty())
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TypeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TypeUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TypeUrl {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<TypeUrl> for String {
    fn from(t: TypeUrl) -> Self {
        t.0
    }
}

impl AsRef<str> for TypeUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
