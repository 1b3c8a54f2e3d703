//! Error types for xDS resource distribution.
//!
//! The cache operations themselves (`update`, `contents`, `query`, waiting)
//! cannot fail. [`XdsError`] covers the edges around them: encoding resources
//! for the wire, translating graph entries, loading configuration, and wiring
//! caches together at startup.

/// Error type for xDS resource distribution.
///
/// # Example
///
/// ```rust
/// use xds_core::{TypeUrl, XdsError};
///
/// fn validate_name(name: &str) -> Result<(), XdsError> {
///     if name.is_empty() {
///         return Err(XdsError::translation(
///             TypeUrl::CLUSTER,
///             name,
///             "resource name cannot be empty",
///         ));
///     }
///     Ok(())
/// }
///
/// assert!(validate_name("").is_err());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum XdsError {
    /// Malformed or unknown type URL.
    #[error("invalid type URL: {type_url} - {reason}")]
    InvalidTypeUrl {
        /// The invalid type URL.
        type_url: String,
        /// Reason why the type URL is invalid.
        reason: String,
    },

    /// A configuration-graph entry could not be turned into a wire resource.
    #[error("translation of {type_url}/{name} failed: {reason}")]
    TranslationFailed {
        /// The type URL the entry was being translated into.
        type_url: String,
        /// Canonical name of the entry.
        name: String,
        /// Reason for the failure.
        reason: String,
    },

    /// A resource could not be encoded for the channel serving it.
    #[error("encoding error for {type_url}: {message}")]
    EncodingError {
        /// The type URL of the channel being served.
        type_url: String,
        /// Error message.
        message: String,
    },

    /// A cache for this resource type is already registered.
    #[error("a cache for {type_url} is already registered")]
    DuplicateCache {
        /// The type URL served by both caches.
        type_url: String,
    },

    /// No cache is registered for the requested resource type.
    #[error("no cache registered for {type_url}")]
    UnknownType {
        /// The requested type URL.
        type_url: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl XdsError {
    /// Create a translation error for the named entry.
    pub fn translation(
        type_url: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::TranslationFailed {
            type_url: type_url.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an encoding error for the channel serving `type_url`.
    pub fn encoding(type_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncodingError {
            type_url: type_url.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
