//! Size + TTL cache
//!
//! Entries expire after a time-to-live and/or an idle timeout. The size bound
//! is enforced by LRU eviction once expired entries have been purged. Values
//! can be loaded synchronously or asynchronously on miss, refreshed, and
//! preloaded in bulk.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, warn, Span};

use crate::cache::{CacheEntry, CacheStats, LruTracker, ResultCache, StatsSnapshot};
use crate::error::{CatalogError, Result};
use crate::tasks::spawn_maintenance_task;

// == Config ==
/// Construction parameters for [`TtlCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlCacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Lifetime measured from creation, None = unbounded
    pub time_to_live: Option<Duration>,
    /// Lifetime measured from the last read, None = unbounded
    pub idle_timeout: Option<Duration>,
    /// Period of the background purge started by `start_maintenance`
    pub cleanup_interval: Duration,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            time_to_live: Some(Duration::from_secs(300)),
            idle_timeout: None,
            cleanup_interval: Duration::from_secs(1),
        }
    }
}

impl TtlCacheConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.idle_timeout = Some(idle);
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CatalogError::InvalidConfig(
                "TTL cache max_entries must be positive".to_string(),
            ));
        }
        if self.time_to_live == Some(Duration::ZERO) {
            return Err(CatalogError::InvalidConfig(
                "TTL cache time_to_live must be positive".to_string(),
            ));
        }
        if self.idle_timeout == Some(Duration::ZERO) {
            return Err(CatalogError::InvalidConfig(
                "TTL cache idle_timeout must be positive".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(CatalogError::InvalidConfig(
                "TTL cache cleanup_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct TtlState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    lru: LruTracker<K>,
}

impl<K: Eq + Hash + Clone, V> TtlState<K, V> {
    fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru.remove(key);
        }
        removed
    }

    fn purge_expired(&mut self, now: Instant, config: &TtlCacheConfig) -> usize {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, config.time_to_live, config.idle_timeout))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

#[derive(Debug)]
struct Shared<K, V> {
    state: Mutex<TtlState<K, V>>,
    stats: CacheStats,
    config: TtlCacheConfig,
}

// == TTL Cache ==
/// Thread-safe cache with TTL/idle expiry, LRU size bound and loaders.
///
/// Cloning yields another handle to the same cache.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    shared: Arc<Shared<K, V>>,
    span: Span,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            span: self.span.clone(),
        }
    }
}

/// Non-owning handle used by the maintenance task.
#[derive(Debug)]
pub struct WeakTtlCache<K, V> {
    shared: Weak<Shared<K, V>>,
    span: Span,
}

impl<K, V> WeakTtlCache<K, V> {
    /// Returns a live handle, or None once every owner is gone.
    pub fn upgrade(&self) -> Option<TtlCache<K, V>> {
        self.shared.upgrade().map(|shared| TtlCache {
            shared,
            span: self.span.clone(),
        })
    }

    /// Span of the cache this handle points to.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    // == Constructor ==
    /// Creates a cache. Zero capacity, TTL, idle timeout or interval is rejected.
    pub fn new(config: TtlCacheConfig) -> Result<Self> {
        config.validate()?;
        let span = tracing::debug_span!(
            "result_cache",
            policy = "ttl",
            capacity = config.max_entries
        );

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TtlState {
                    entries: HashMap::with_capacity(config.max_entries),
                    lru: LruTracker::new(),
                }),
                stats: CacheStats::new(),
                config,
            }),
            span,
        })
    }

    /// Replaces the span this handle logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &TtlCacheConfig {
        &self.shared.config
    }

    pub fn downgrade(&self) -> WeakTtlCache<K, V> {
        WeakTtlCache {
            shared: Arc::downgrade(&self.shared),
            span: self.span.clone(),
        }
    }

    // == Get ==
    /// Returns a live value. An expired entry is dropped and counted as a miss.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let config = &self.shared.config;
        let now = Instant::now();
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        let lookup = state.entries.get(key).map(|entry| {
            (
                entry.is_expired(now, config.time_to_live, config.idle_timeout),
                entry.touched(now),
            )
        });

        match lookup {
            Some((false, touched)) => {
                let value = Arc::clone(&touched.value);
                state.entries.insert(key.clone(), touched);
                state.lru.touch(key);
                self.shared.stats.record_hit();
                Some(value)
            }
            Some((true, _)) => {
                state.remove(key);
                self.shared.stats.record_expirations(1);
                self.shared.stats.record_miss();
                debug!(parent: &self.span, ?key, "entry expired on read");
                None
            }
            None => {
                self.shared.stats.record_miss();
                None
            }
        }
    }

    /// Returns the current entry snapshot without touching it or the counters.
    pub fn peek_entry(&self, key: &K) -> Option<CacheEntry<V>> {
        self.shared.state.lock().entries.get(key).cloned()
    }

    // == Put ==
    /// Stores a value and returns the shared handle to it.
    pub fn put(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.put_shared(key, Arc::clone(&value));
        value
    }

    /// Stores an already shared value, replacing any entry for the key.
    ///
    /// When a new key would exceed the size bound, expired entries are purged
    /// first and any remaining overflow is evicted in LRU order.
    pub fn put_shared(&self, key: K, value: Arc<V>) {
        let config = &self.shared.config;
        let now = Instant::now();
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;

        if !state.entries.contains_key(&key) && state.entries.len() >= config.max_entries {
            let purged = state.purge_expired(now, config);
            self.shared.stats.record_expirations(purged as u64);

            while state.entries.len() >= config.max_entries {
                let Some(oldest) = state.lru.evict_oldest() else {
                    break;
                };
                state.entries.remove(&oldest);
                self.shared.stats.record_eviction();
                debug!(parent: &self.span, key = ?oldest, "evicted least recently used entry");
            }
        }

        state.entries.insert(key.clone(), CacheEntry::new(value, now));
        state.lru.touch(&key);
    }

    // == Get Or Load ==
    /// Returns the cached value, or runs `loader` on miss and caches its result.
    ///
    /// The loader runs outside the cache lock. A failed load caches nothing.
    pub fn get_or_load<F>(&self, key: K, loader: F) -> Result<Arc<V>>
    where
        F: FnOnce(&K) -> anyhow::Result<V>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let started = std::time::Instant::now();
        let outcome = loader(&key);
        self.finish_load(key, outcome, started.elapsed())
    }

    // == Get Or Load Async ==
    /// Async form of [`TtlCache::get_or_load`]; the entry is populated when
    /// the loader's future completes.
    ///
    /// Two tasks missing on the same key may both load; the later store wins.
    pub async fn get_or_load_async<F, Fut>(&self, key: K, loader: F) -> Result<Arc<V>>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        self.load_async(key, loader).await
    }

    // == Refresh ==
    /// Reloads `key` regardless of the current entry and replaces it.
    ///
    /// On loader failure the previous entry, if any, stays in place.
    pub async fn refresh<F, Fut>(&self, key: K, loader: F) -> Result<Arc<V>>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        debug!(parent: &self.span, ?key, "refreshing entry");
        self.load_async(key, loader).await
    }

    async fn load_async<F, Fut>(&self, key: K, loader: F) -> Result<Arc<V>>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        let started = std::time::Instant::now();
        let outcome = loader(key.clone()).await;
        self.finish_load(key, outcome, started.elapsed())
    }

    fn finish_load(&self, key: K, outcome: anyhow::Result<V>, elapsed: Duration) -> Result<Arc<V>> {
        match outcome {
            Ok(value) => {
                self.shared.stats.record_load(elapsed);
                let value = Arc::new(value);
                self.put_shared(key, Arc::clone(&value));
                Ok(value)
            }
            Err(source) => {
                self.shared.stats.record_load_failure(elapsed);
                warn!(parent: &self.span, ?key, error = %source, "loader failed");
                Err(CatalogError::load_failed(&key, source))
            }
        }
    }

    // == Invalidation ==
    /// Drops one key. Returns whether it was cached.
    pub fn invalidate(&self, key: &K) -> bool {
        self.shared.state.lock().remove(key).is_some()
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        let mut state = self.shared.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.lru.clear();
        debug!(parent: &self.span, dropped, "invalidated all entries");
    }

    /// Drops every entry matching `predicate`. Returns how many were dropped.
    pub fn invalidate_if<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K, &V) -> bool,
    {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        let doomed: Vec<K> = state
            .entries
            .iter()
            .filter(|(key, entry)| predicate(key, &entry.value))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            state.remove(key);
        }
        doomed.len()
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    ///
    /// This is the entry point the maintenance task uses.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let removed = self
            .shared
            .state
            .lock()
            .purge_expired(now, &self.shared.config);
        self.shared.stats.record_expirations(removed as u64);
        removed
    }

    /// True when a live entry exists. Does not touch recency or counters.
    pub fn contains_key(&self, key: &K) -> bool {
        let config = &self.shared.config;
        let now = Instant::now();
        self.shared
            .state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now, config.time_to_live, config.idle_timeout))
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot(self.len())
    }

    pub fn reset_stats(&self) {
        self.shared.stats.reset();
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Warm Up ==
    /// Loads every key concurrently. Returns how many keys ended up cached.
    ///
    /// Keys already cached count without invoking the loader. Failed or
    /// panicking loads are logged and skipped.
    pub async fn warm_up<I, F, Fut>(&self, keys: I, loader: F) -> usize
    where
        I: IntoIterator<Item = K>,
        F: Fn(K) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let mut loads = JoinSet::new();
        for key in keys {
            let cache = self.clone();
            let loader = loader.clone();
            loads.spawn(async move { cache.get_or_load_async(key, loader).await });
        }

        let mut loaded = 0;
        while let Some(joined) = loads.join_next().await {
            match joined {
                Ok(Ok(_)) => loaded += 1,
                Ok(Err(err)) => debug!(parent: &self.span, error = %err, "warm-up load skipped"),
                Err(err) => warn!(parent: &self.span, error = %err, "warm-up task panicked"),
            }
        }
        debug!(parent: &self.span, loaded, "warm-up finished");
        loaded
    }

    // == Start Maintenance ==
    /// Spawns the periodic purge on the current tokio runtime.
    ///
    /// The task stops by itself once every handle to the cache is dropped.
    pub fn start_maintenance(&self) -> JoinHandle<()> {
        spawn_maintenance_task(self, self.shared.config.cleanup_interval)
    }
}

impl<K, V> ResultCache<K, V> for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    V: Send + Sync,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        TtlCache::get(self, key)
    }

    fn insert(&self, key: K, value: Arc<V>) {
        self.put_shared(key, value);
    }

    fn invalidate(&self, key: &K) -> bool {
        TtlCache::invalidate(self, key)
    }

    fn invalidate_all(&self) {
        TtlCache::invalidate_all(self);
    }

    fn len(&self) -> usize {
        TtlCache::len(self)
    }

    fn capacity(&self) -> usize {
        self.shared.config.max_entries
    }

    fn stats(&self) -> StatsSnapshot {
        TtlCache::stats(self)
    }

    fn reset_stats(&self) {
        TtlCache::reset_stats(self);
    }

    fn policy_name(&self) -> &'static str {
        "ttl"
    }
}
