//! Cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for one resource cache.
///
/// All counters are atomic and can be safely accessed from multiple threads.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of whole-set updates.
    updates: AtomicU64,
    /// Number of full content reads.
    content_reads: AtomicU64,
    /// Number of queries.
    queries: AtomicU64,
    /// Number of requested names a query did not hold.
    names_omitted: AtomicU64,
    /// Number of waiters woken by updates.
    waiters_woken: AtomicU64,
}

impl CacheStats {
    /// Create new cache statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an update.
    #[inline]
    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a full content read.
    #[inline]
    pub fn record_read(&self) {
        self.content_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a query and how many requested names it omitted.
    #[inline]
    pub fn record_query(&self, omitted: u64) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.names_omitted.fetch_add(omitted, Ordering::Relaxed);
    }

    /// Record waiters woken by an update.
    #[inline]
    pub fn record_woken(&self, count: u64) {
        self.waiters_woken.fetch_add(count, Ordering::Relaxed);
    }

    /// Get total updates.
    #[inline]
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Get total full content reads.
    #[inline]
    pub fn content_reads(&self) -> u64 {
        self.content_reads.load(Ordering::Relaxed)
    }

    /// Get total queries.
    #[inline]
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Get total names omitted by queries.
    #[inline]
    pub fn names_omitted(&self) -> u64 {
        self.names_omitted.load(Ordering::Relaxed)
    }

    /// Get total waiters woken.
    #[inline]
    pub fn waiters_woken(&self) -> u64 {
        self.waiters_woken.load(Ordering::Relaxed)
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.updates.store(0, Ordering::Relaxed);
        self.content_reads.store(0, Ordering::Relaxed);
        self.queries.store(0, Ordering::Relaxed);
        self.names_omitted.store(0, Ordering::Relaxed);
        self.waiters_woken.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_stats_basic() {
        let stats = CacheStats::new();

        stats.record_update();
        stats.record_read();
        stats.record_query(2);
        stats.record_query(0);
        stats.record_woken(3);

        assert_eq!(stats.updates(), 1);
        assert_eq!(stats.content_reads(), 1);
        assert_eq!(stats.queries(), 2);
        assert_eq!(stats.names_omitted(), 2);
        assert_eq!(stats.waiters_woken(), 3);
    }

    #[test]
    fn cache_stats_reset() {
        let stats = CacheStats::new();
        stats.record_update();
        stats.record_query(1);
        stats.reset();
        assert_eq!(stats.updates(), 0);
        assert_eq!(stats.names_omitted(), 0);
    }
}
