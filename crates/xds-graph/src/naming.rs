//! Canonical cluster names.
//!
//! A cluster name is `namespace/service/port/hash`. The hash covers every
//! other upstream setting the translator reads: port name, load balancing,
//! health check path, protocol, SNI, external name and connect timeout.
//! Two routes pointing at the same port with the same settings therefore
//! share one cluster, while differing settings produce distinct clusters.

use std::hash::Hasher;

use fnv::FnvHasher;

use crate::model::UpstreamCluster;

/// Longest name produced by [`cluster_name`].
pub const MAX_NAME_LEN: usize = 60;

const SETTINGS_HASH_LEN: usize = 10;
const SHORT_HASH_LEN: usize = 6;

/// Canonical name of the cluster generated for `upstream`.
pub fn cluster_name(upstream: &UpstreamCluster) -> String {
    let mut hasher = FnvHasher::default();
    for part in [
        upstream.port_name.as_deref().unwrap_or_default(),
        upstream.lb_policy.as_str(),
        upstream.health_check_path.as_deref().unwrap_or_default(),
        upstream.protocol.as_deref().unwrap_or_default(),
        upstream.sni.as_deref().unwrap_or_default(),
        upstream.external_name.as_deref().unwrap_or_default(),
    ] {
        hasher.write(part.as_bytes());
        // Separator so ("ab", "") and ("a", "b") differ.
        hasher.write_u8(0xff);
    }
    if let Some(timeout) = upstream.connect_timeout {
        hasher.write_u128(timeout.as_nanos());
    }

    let digest = format!("{:016x}", hasher.finish());
    let port = upstream.port.to_string();
    hash_name(
        MAX_NAME_LEN,
        &[
            upstream.namespace.as_str(),
            upstream.service.as_str(),
            port.as_str(),
            &digest[..SETTINGS_HASH_LEN],
        ],
    )
}

/// Join `parts` with `/`, truncating to at most `limit` bytes.
///
/// A name that fits is returned as is. A longer name keeps as much of its
/// prefix as fits and ends in `-` plus a short hash of the full name, so
/// distinct long names stay distinct.
pub fn hash_name(limit: usize, parts: &[&str]) -> String {
    let joined = parts.join("/");
    if joined.len() <= limit {
        return joined;
    }

    let mut hasher = FnvHasher::default();
    hasher.write(joined.as_bytes());
    let hash = format!("{:016x}", hasher.finish());

    if limit <= SHORT_HASH_LEN + 1 {
        return hash[..limit.min(hash.len())].to_string();
    }

    let keep = floor_char_boundary(&joined, limit - SHORT_HASH_LEN - 1);
    format!("{}-{}", &joined[..keep], &hash[..SHORT_HASH_LEN])
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    (0..=index.min(s.len()))
        .rev()
        .find(|i| s.is_char_boundary(*i))
        .unwrap_or(0)
}
