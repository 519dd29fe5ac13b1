//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and loads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

// == Cache Stats ==
/// Live counters for one cache instance.
///
/// Counters are atomics so recording never needs the cache lock.
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    total_load_nanos: AtomicU64,
    since: Mutex<DateTime<Utc>>,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            total_load_nanos: AtomicU64::new(0),
            since: Mutex::new(Utc::now()),
        }
    }
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Eviction ==
    /// Counts an entry removed to respect the size bound.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Expiration ==
    /// Counts entries removed because their TTL or idle timeout elapsed.
    pub fn record_expirations(&self, count: u64) {
        if count > 0 {
            self.expirations.fetch_add(count, Ordering::Relaxed);
        }
    }

    // == Record Load ==
    /// Counts a successful loader call and its latency.
    pub fn record_load(&self, elapsed: Duration) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.add_load_time(elapsed);
    }

    /// Counts a failed loader call. Its latency still counts toward the total.
    pub fn record_load_failure(&self, elapsed: Duration) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
        self.add_load_time(elapsed);
    }

    fn add_load_time(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_load_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into an immutable snapshot.
    pub fn snapshot(&self, total_entries: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            total_load_nanos: self.total_load_nanos.load(Ordering::Relaxed),
            total_entries,
            since: *self.since.lock(),
        }
    }

    // == Reset ==
    /// Zeroes every counter and restarts the measurement window.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.expirations,
            &self.loads,
            &self.load_failures,
            &self.total_load_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.since.lock() = Utc::now();
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed by the size bound
    pub evictions: u64,
    /// Entries removed by TTL or idle expiry
    pub expirations: u64,
    /// Successful loader calls
    pub loads: u64,
    /// Failed loader calls
    pub load_failures: u64,
    /// Cumulative loader latency in nanoseconds
    pub total_load_nanos: u64,
    /// Entries held when the snapshot was taken
    pub total_entries: usize,
    /// Start of the measurement window
    pub since: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn hit_count(&self) -> u64 {
        self.hits
    }

    pub fn miss_count(&self) -> u64 {
        self.misses
    }

    pub fn request_count(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.request_count();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Returns misses / (hits + misses), or 0.0 if no requests have been made.
    pub fn miss_rate(&self) -> f64 {
        let total = self.request_count();
        if total == 0 {
            0.0
        } else {
            self.misses as f64 / total as f64
        }
    }

    /// Mean latency of loader calls, successful or not.
    pub fn average_load_penalty(&self) -> Duration {
        let calls = self.loads + self.load_failures;
        if calls == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_load_nanos / calls)
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let snapshot = CacheStats::new().snapshot(0);
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.misses, 0);
        assert_eq!(snapshot.evictions, 0);
        assert_eq!(snapshot.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let snapshot = CacheStats::new().snapshot(0);
        assert_eq!(snapshot.hit_rate(), 0.0);
        assert_eq!(snapshot.miss_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        assert_eq!(stats.snapshot(0).hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_three_misses_seven_hits() {
        let stats = CacheStats::new();
        for _ in 0..3 {
            stats.record_miss();
        }
        for _ in 0..7 {
            stats.record_hit();
        }

        let snapshot = stats.snapshot(0);
        assert_eq!(snapshot.hit_rate(), 0.7);
        assert_eq!(snapshot.miss_count(), 3);
        assert_eq!(snapshot.hit_count(), 7);
        assert_eq!(snapshot.request_count(), 10);
    }

    #[test]
    fn test_average_load_penalty() {
        let stats = CacheStats::new();
        stats.record_load(Duration::from_millis(10));
        stats.record_load(Duration::from_millis(30));
        stats.record_load_failure(Duration::from_millis(20));

        let snapshot = stats.snapshot(2);
        assert_eq!(snapshot.loads, 2);
        assert_eq!(snapshot.load_failures, 1);
        assert_eq!(snapshot.average_load_penalty(), Duration::from_millis(20));
        assert_eq!(snapshot.total_entries, 2);
    }

    #[test]
    fn test_reset() {
        let stats = CacheStats::new();
        let before = stats.snapshot(0).since;
        stats.record_hit();
        stats.record_eviction();
        stats.record_expirations(4);

        stats.reset();

        let snapshot = stats.snapshot(0);
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.evictions, 0);
        assert_eq!(snapshot.expirations, 0);
        assert!(snapshot.since >= before);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = CacheStats::new();
        stats.record_hit();
        let json = serde_json::to_value(stats.snapshot(1)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["total_entries"], 1);
        assert!(json["since"].is_string());
    }
}
