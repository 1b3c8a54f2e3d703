//! The [`Resource`] trait and helpers for wire encoding.

use std::fmt;
use std::sync::Arc;

use crate::Result;

/// A named configuration object served over one discovery channel.
///
/// Resources are immutable once published: caches hold them behind an
/// [`Arc`] and hand readers clones of that `Arc`, never access to the map
/// they live in.
///
/// # Example
///
/// ```rust
/// use xds_core::{Resource, TypeUrl};
///
/// #[derive(Debug)]
/// struct MyCluster {
///     name: String,
/// }
///
/// impl Resource for MyCluster {
///     fn type_url(&self) -> &str {
///         TypeUrl::CLUSTER
///     }
///
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     fn encode(&self) -> xds_core::Result<prost_types::Any> {
///         Ok(prost_types::Any {
///             type_url: self.type_url().to_string(),
///             value: self.name.as_bytes().to_vec(),
///         })
///     }
/// }
///
/// let cluster = MyCluster { name: "web".to_string() };
/// assert_eq!(cluster.encode().unwrap().value, b"web");
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Get the type URL for this resource.
    fn type_url(&self) -> &str;

    /// Get the resource name, unique within its type.
    fn name(&self) -> &str;

    /// Encode the resource to a protobuf `Any`.
    ///
    /// Encoding must be deterministic: the same value always produces the
    /// same bytes.
    fn encode(&self) -> Result<prost_types::Any>;
}

/// Type alias for a shared, type-erased resource.
pub type BoxResource = Arc<dyn Resource>;

/// Encode a prost message into an `Any` with the given type URL.
pub fn encode_message<M: prost::Message>(type_url: &str, message: &M) -> prost_types::Any {
    prost_types::Any {
        type_url: type_url.to_string(),
        value: message.encode_to_vec(),
    }
}

/// A pre-encoded resource.
///
/// Useful for resources that arrive already serialized, such as
/// bootstrap resources loaded from disk, and in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyResource {
    name: String,
    any: prost_types::Any,
}

impl AnyResource {
    /// Create a new AnyResource.
    #[must_use]
    pub fn new(name: impl Into<String>, any: prost_types::Any) -> Self {
        Self {
            name: name.into(),
            any,
        }
    }

    /// Create an AnyResource from a type URL and raw payload.
    #[must_use]
    pub fn from_bytes(
        type_url: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self::new(
            name,
            prost_types::Any {
                type_url: type_url.into(),
                value: value.into(),
            },
        )
    }

    /// Get the inner Any message.
    #[must_use]
    pub fn inner(&self) -> &prost_types::Any {
        &self.any
    }

    /// Consume and return the inner Any message.
    #[must_use]
    pub fn into_inner(self) -> prost_types::Any {
        self.any
    }
}

impl Resource for AnyResource {
    fn type_url(&self) -> &str {
        &self.any.type_url
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self) -> Result<prost_types::Any> {
        Ok(self.any.clone())
    }
}
