//! # xds-types
//!
//! Protobuf messages for the Envoy resources this control plane serves.
//!
//! The messages mirror the subset of the Envoy v3 API the cluster pipeline
//! produces, with the upstream field numbers, so that the encoded bytes
//! are what a proxy expects. Each top-level resource implements
//! [`xds_core::Resource`] so it can be stored in a resource cache.
//!
//! Encoding is deterministic: prost writes fields in tag order and these
//! messages contain no maps.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)] // Message fields follow the upstream API docs

// Re-export prost types for convenience
pub use prost::Message;
pub use prost_types::{Any, Duration};

pub use envoy::config::cluster::v3::{
    cluster::{DiscoveryType, LbPolicy},
    Cluster, EdsClusterConfig,
};
pub use envoy::config::core::v3::{
    health_check::HttpHealthCheck, socket_address::Protocol, Address, HealthCheck,
    Http2ProtocolOptions, SocketAddress, TransportSocket,
};
pub use envoy::extensions::transport_sockets::tls::v3::{CommonTlsContext, UpstreamTlsContext};
pub use envoy::config::endpoint::v3::{
    ClusterLoadAssignment, Endpoint, LbEndpoint, LocalityLbEndpoints,
};

pub mod envoy {
    //! Envoy xDS types.

    pub mod config {
        //! Envoy configuration resources.

        pub mod core {
            //! Shared core types.

            pub mod v3 {
                //! Core v3 API.

                /// A network address.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Address {
                    #[prost(message, optional, tag = "1")]
                    pub socket_address: ::core::option::Option<SocketAddress>,
                }

                /// An IP or DNS address with a port.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct SocketAddress {
                    #[prost(enumeration = "socket_address::Protocol", tag = "1")]
                    pub protocol: i32,
                    #[prost(string, tag = "2")]
                    pub address: ::prost::alloc::string::String,
                    #[prost(uint32, tag = "3")]
                    pub port_value: u32,
                    #[prost(bool, tag = "6")]
                    pub ipv4_compat: bool,
                }

                pub mod socket_address {
                    //! Nested types for `SocketAddress`.

                    /// Transport protocol of a socket address.
                    #[derive(
                        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum Protocol {
                        Tcp = 0,
                        Udp = 1,
                    }
                }

                /// HTTP/2 settings for upstream connections.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Http2ProtocolOptions {
                    #[prost(message, optional, tag = "2")]
                    pub max_concurrent_streams: ::core::option::Option<u32>,
                }

                /// A transport socket with its typed configuration.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct TransportSocket {
                    #[prost(string, tag = "1")]
                    pub name: ::prost::alloc::string::String,
                    #[prost(message, optional, tag = "3")]
                    pub typed_config: ::core::option::Option<::prost_types::Any>,
                }

                /// Active health checking of upstream hosts.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct HealthCheck {
                    #[prost(message, optional, tag = "1")]
                    pub timeout: ::core::option::Option<::prost_types::Duration>,
                    #[prost(message, optional, tag = "2")]
                    pub interval: ::core::option::Option<::prost_types::Duration>,
                    #[prost(message, optional, tag = "4")]
                    pub unhealthy_threshold: ::core::option::Option<u32>,
                    #[prost(message, optional, tag = "5")]
                    pub healthy_threshold: ::core::option::Option<u32>,
                    #[prost(message, optional, tag = "8")]
                    pub http_health_check: ::core::option::Option<health_check::HttpHealthCheck>,
                }

                pub mod health_check {
                    //! Nested types for `HealthCheck`.

                    /// An HTTP GET health check.
                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct HttpHealthCheck {
                        #[prost(string, tag = "1")]
                        pub host: ::prost::alloc::string::String,
                        #[prost(string, tag = "2")]
                        pub path: ::prost::alloc::string::String,
                    }
                }
            }
        }

        pub mod endpoint {
            //! Endpoint (EDS) resources.

            pub mod v3 {
                //! Endpoint v3 API.

                use crate::envoy::config::core::v3::Address;

                /// The endpoints of a cluster, grouped by locality.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct ClusterLoadAssignment {
                    #[prost(string, tag = "1")]
                    pub cluster_name: ::prost::alloc::string::String,
                    #[prost(message, repeated, tag = "2")]
                    pub endpoints: ::prost::alloc::vec::Vec<LocalityLbEndpoints>,
                }

                /// Endpoints sharing a locality and priority.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct LocalityLbEndpoints {
                    #[prost(message, repeated, tag = "2")]
                    pub lb_endpoints: ::prost::alloc::vec::Vec<LbEndpoint>,
                    #[prost(uint32, tag = "5")]
                    pub priority: u32,
                }

                /// A single load-balanced endpoint.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct LbEndpoint {
                    #[prost(message, optional, tag = "1")]
                    pub endpoint: ::core::option::Option<Endpoint>,
                    #[prost(uint32, tag = "4")]
                    pub load_balancing_weight: u32,
                }

                /// An upstream host.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Endpoint {
                    #[prost(message, optional, tag = "1")]
                    pub address: ::core::option::Option<Address>,
                    #[prost(string, tag = "3")]
                    pub hostname: ::prost::alloc::string::String,
                }
            }
        }

        pub mod cluster {
            //! Cluster (CDS) resources.

            pub mod v3 {
                //! Cluster v3 API.

                use crate::envoy::config::core::v3::{
                    HealthCheck, Http2ProtocolOptions, TransportSocket,
                };
                use crate::envoy::config::endpoint::v3::ClusterLoadAssignment;

                /// An upstream cluster.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct Cluster {
                    #[prost(string, tag = "1")]
                    pub name: ::prost::alloc::string::String,
                    #[prost(enumeration = "cluster::DiscoveryType", tag = "2")]
                    pub r#type: i32,
                    #[prost(message, optional, tag = "3")]
                    pub eds_cluster_config: ::core::option::Option<EdsClusterConfig>,
                    #[prost(message, optional, tag = "4")]
                    pub connect_timeout: ::core::option::Option<::prost_types::Duration>,
                    #[prost(enumeration = "cluster::LbPolicy", tag = "6")]
                    pub lb_policy: i32,
                    #[prost(message, repeated, tag = "8")]
                    pub health_checks: ::prost::alloc::vec::Vec<HealthCheck>,
                    #[prost(message, optional, tag = "14")]
                    pub http2_protocol_options: ::core::option::Option<Http2ProtocolOptions>,
                    #[prost(message, optional, tag = "24")]
                    pub transport_socket: ::core::option::Option<TransportSocket>,
                    #[prost(string, tag = "28")]
                    pub alt_stat_name: ::prost::alloc::string::String,
                    #[prost(message, optional, tag = "33")]
                    pub load_assignment: ::core::option::Option<ClusterLoadAssignment>,
                }

                /// Where an EDS cluster gets its endpoints.
                #[derive(Clone, PartialEq, ::prost::Message)]
                pub struct EdsClusterConfig {
                    #[prost(string, tag = "2")]
                    pub service_name: ::prost::alloc::string::String,
                }

                pub mod cluster {
                    //! Nested types for `Cluster`.

                    /// Service discovery type of a cluster.
                    #[derive(
                        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum DiscoveryType {
                        Static = 0,
                        StrictDns = 1,
                        LogicalDns = 2,
                        Eds = 3,
                        OriginalDst = 4,
                    }

                    /// Load balancing policy of a cluster.
                    #[derive(
                        Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
                    )]
                    #[repr(i32)]
                    pub enum LbPolicy {
                        RoundRobin = 0,
                        LeastRequest = 1,
                        RingHash = 2,
                        Random = 3,
                        Maglev = 5,
                    }
                }
            }
        }
    }

    pub mod extensions {
        //! Envoy extension configuration.

        pub mod transport_sockets {
            //! Transport socket extensions.

            pub mod tls {
                //! TLS transport socket.

                pub mod v3 {
                    //! TLS v3 API.

                    /// Settings shared by client and server TLS contexts.
                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct CommonTlsContext {
                        #[prost(string, repeated, tag = "4")]
                        pub alpn_protocols: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
                    }

                    /// TLS settings for connections to an upstream.
                    #[derive(Clone, PartialEq, ::prost::Message)]
                    pub struct UpstreamTlsContext {
                        #[prost(message, optional, tag = "1")]
                        pub common_tls_context: ::core::option::Option<CommonTlsContext>,
                        #[prost(string, tag = "2")]
                        pub sni: ::prost::alloc::string::String,
                    }
                }
            }
        }
    }
}

impl ClusterLoadAssignment {
    /// A load assignment with a single TCP endpoint at `address:port`.
    pub fn single_endpoint(
        cluster_name: impl Into<String>,
        address: impl Into<String>,
        port: u32,
    ) -> Self {
        let endpoint = LbEndpoint {
            endpoint: Some(Endpoint {
                address: Some(Address {
                    socket_address: Some(SocketAddress {
                        protocol: Protocol::Tcp as i32,
                        address: address.into(),
                        port_value: port,
                        ipv4_compat: true,
                    }),
                }),
                hostname: String::new(),
            }),
            load_balancing_weight: 0,
        };

        Self {
            cluster_name: cluster_name.into(),
            endpoints: vec![LocalityLbEndpoints {
                lb_endpoints: vec![endpoint],
                priority: 0,
            }],
        }
    }
}

/// Type URL of [`UpstreamTlsContext`] inside a transport socket.
pub const UPSTREAM_TLS_CONTEXT_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.UpstreamTlsContext";

/// Name of the TLS transport socket.
pub const TLS_TRANSPORT_SOCKET: &str = "envoy.transport_sockets.tls";

impl TransportSocket {
    /// A TLS transport socket carrying `context`.
    pub fn upstream_tls(context: &UpstreamTlsContext) -> Self {
        Self {
            name: TLS_TRANSPORT_SOCKET.to_string(),
            typed_config: Some(xds_core::encode_message(
                UPSTREAM_TLS_CONTEXT_TYPE_URL,
                context,
            )),
        }
    }
}

macro_rules! impl_resource {
    ($message:ty, $type_url:expr, $name:ident) => {
        impl xds_core::Resource for $message {
            fn type_url(&self) -> &str {
                $type_url
            }

            fn name(&self) -> &str {
                &self.$name
            }

            fn encode(&self) -> xds_core::Result<prost_types::Any> {
                Ok(xds_core::encode_message($type_url, self))
            }
        }
    };
}

impl_resource!(Cluster, xds_core::TypeUrl::CLUSTER, name);
impl_resource!(
    ClusterLoadAssignment,
    xds_core::TypeUrl::ENDPOINT,
    cluster_name
);
