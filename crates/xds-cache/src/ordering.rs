//! Deterministic ordering of resources.
//!
//! Snapshots are sorted by resource name so that the same logical content
//! always serializes to the same bytes, whatever order the backing map
//! iterates in.

use std::cmp::Ordering;
use std::sync::Arc;

use xds_core::Resource;

/// Compare two resources by name (byte order).
#[inline]
pub fn by_name<R: Resource + ?Sized>(a: &R, b: &R) -> Ordering {
    a.name().cmp(b.name())
}

/// Sort resources by name.
///
/// The sort is stable: resources sharing a name keep their relative order.
pub fn sort_resources<R: Resource + ?Sized>(resources: &mut [Arc<R>]) {
    resources.sort_by(|a, b| by_name(&**a, &**b));
}

/// Drop all but the first of each run of same-named resources.
///
/// Expects `resources` to be sorted with [`sort_resources`].
pub fn dedup_by_name<R: Resource + ?Sized>(resources: &mut Vec<Arc<R>>) {
    resources.dedup_by(|later, earlier| later.name() == earlier.name());
}
