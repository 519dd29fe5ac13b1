//! Cache Module
//!
//! Bounded caches for search results: a fixed-capacity LRU and a size + TTL
//! cache with async loading, refresh and background maintenance.

mod entry;
mod lru;
mod lru_cache;
mod stats;
mod ttl_cache;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use lru_cache::LruCache;
pub use stats::{CacheStats, StatsSnapshot};
pub use ttl_cache::{TtlCache, TtlCacheConfig, WeakTtlCache};

// == Result Cache ==
/// Operations shared by every cache policy.
///
/// Object safe so a service can hold `Box<dyn ResultCache<K, V>>` and pick the
/// policy at runtime.
pub trait ResultCache<K, V>: Send + Sync {
    /// Returns the cached value, recording a hit or miss.
    fn get(&self, key: &K) -> Option<Arc<V>>;

    /// Stores a value, evicting as the policy requires.
    fn insert(&self, key: K, value: Arc<V>);

    /// Drops one key. Returns whether it was cached.
    fn invalidate(&self, key: &K) -> bool;

    /// Drops every entry.
    fn invalidate_all(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    fn capacity(&self) -> usize;

    fn stats(&self) -> StatsSnapshot;

    fn reset_stats(&self);

    /// Short policy label for logs.
    fn policy_name(&self) -> &'static str;
}
