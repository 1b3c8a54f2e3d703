//! # xds-core
//!
//! Core types, traits, and error handling shared by the xDS resource
//! distribution crates.
//!
//! This crate provides the vocabulary the other crates speak:
//!
//! - [`Resource`] - Trait for named, wire-encodable configuration objects
//! - [`TypeUrl`] - Identifies the discovery channel a cache feeds
//! - [`ResourceVersion`] - Content digest of an ordered resource sequence
//! - [`XdsError`] - Error type for the few fallible operations
//!
//! ## Example
//!
//! ```rust
//! use xds_core::{ResourceVersion, TypeUrl};
//!
//! let clusters = TypeUrl::new(TypeUrl::CLUSTER);
//! assert_eq!(clusters.short_name(), "Cluster");
//! assert_eq!(clusters.service_name(), Some("CDS"));
//!
//! let version = ResourceVersion::new("v1");
//! assert!(!version.is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod resource;
mod type_url;
mod version;

pub use error::XdsError;
pub use resource::{encode_message, AnyResource, BoxResource, Resource};
pub use type_url::TypeUrl;
pub use version::ResourceVersion;

/// Result type alias using [`XdsError`].
pub type Result<T> = std::result::Result<T, XdsError>;
