//! Fixed-capacity LRU cache
//!
//! HashMap storage plus an O(1) LRU tracker behind one mutex.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, Span};

use crate::cache::{CacheStats, LruTracker, ResultCache, StatsSnapshot};
use crate::error::{CatalogError, Result};

#[derive(Debug)]
struct LruState<K, V> {
    entries: HashMap<K, Arc<V>>,
    lru: LruTracker<K>,
}

// == LRU Cache ==
/// Bounded key -> value cache evicting the least recently used entry.
///
/// Every `get` reorders the recency list, so reads take the same exclusive
/// lock as writes.
#[derive(Debug)]
pub struct LruCache<K, V> {
    state: Mutex<LruState<K, V>>,
    stats: CacheStats,
    capacity: usize,
    span: Span,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CatalogError::InvalidConfig(
                "LRU cache capacity must be positive".to_string(),
            ));
        }

        Ok(Self {
            state: Mutex::new(LruState {
                entries: HashMap::with_capacity(capacity),
                lru: LruTracker::new(),
            }),
            stats: CacheStats::new(),
            capacity,
            span: tracing::debug_span!("result_cache", policy = "lru", capacity),
        })
    }

    /// Replaces the span this cache logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // == Get ==
    /// Returns the value and marks it most recently used.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        match state.entries.get(key) {
            Some(value) => {
                let value = Arc::clone(value);
                state.lru.touch(key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Returns the value without touching recency or counters.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.state.lock().entries.get(key).cloned()
    }

    // == Put ==
    /// Stores a value. Returns the entry evicted to make room, if any.
    pub fn put(&self, key: K, value: V) -> Option<(K, Arc<V>)> {
        self.put_shared(key, Arc::new(value))
    }

    /// Stores an already shared value. Returns the evicted entry, if any.
    pub fn put_shared(&self, key: K, value: Arc<V>) -> Option<(K, Arc<V>)> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut evicted = None;
        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            if let Some(oldest) = state.lru.evict_oldest() {
                if let Some(old_value) = state.entries.remove(&oldest) {
                    self.stats.record_eviction();
                    debug!(parent: &self.span, key = ?oldest, "evicted least recently used entry");
                    evicted = Some((oldest, old_value));
                }
            }
        }

        state.lru.touch(&key);
        state.entries.insert(key, value);
        evicted
    }

    // == Remove ==
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let removed = state.entries.remove(key);
        if removed.is_some() {
            state.lru.remove(key);
        }
        removed
    }

    // == Clear ==
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.lru.clear();
        debug!(parent: &self.span, dropped, "cleared cache");
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.len())
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl<K, V> ResultCache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Send + Sync,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        LruCache::get(self, key)
    }

    fn insert(&self, key: K, value: Arc<V>) {
        self.put_shared(key, value);
    }

    fn invalidate(&self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn invalidate_all(&self) {
        self.clear();
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn stats(&self) -> StatsSnapshot {
        LruCache::stats(self)
    }

    fn reset_stats(&self) {
        LruCache::reset_stats(self);
    }

    fn policy_name(&self) -> &'static str {
        "lru"
    }
}
