//! Resource versions derived from content.
//!
//! A discovery server pushes a new response only when what it would send
//! differs from what the proxy already has. Because cache contents are
//! deterministically ordered and resources encode deterministically,
//! hashing the encoded sequence yields a version that is equal exactly when
//! the serialized output is equal.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use fnv::FnvHasher;

use crate::{Resource, Result};

/// Version identifier for an ordered set of resources.
///
/// An empty version represents the initial state (nothing sent yet).
///
/// # Example
///
/// ```rust
/// use xds_core::ResourceVersion;
///
/// let v1 = ResourceVersion::new("v1");
/// let empty = ResourceVersion::empty();
///
/// assert!(!v1.is_empty());
/// assert!(empty.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceVersion(String);

impl ResourceVersion {
    /// Create a new resource version from a string.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Create an empty resource version (initial state).
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Compute the version of an ordered resource sequence.
    ///
    /// Each resource is encoded and fed, length-prefixed, into an FNV-1a
    /// hash. Order matters: callers pass the deterministically sorted
    /// contents of a cache.
    pub fn digest<R>(resources: &[Arc<R>]) -> Result<Self>
    where
        R: Resource + ?Sized,
    {
        let mut hasher = FnvHasher::default();
        hasher.write_usize(resources.len());
        for resource in resources {
            let any = resource.encode()?;
            hasher.write_usize(any.type_url.len());
            hasher.write(any.type_url.as_bytes());
            hasher.write_usize(any.value.len());
            hasher.write(&any.value);
        }
        Ok(Self(format!("{:016x}", hasher.finish())))
    }

    /// Check if the version is empty (initial state).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ResourceVersion {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceVersion {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ResourceVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
