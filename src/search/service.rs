//! Search Service
//!
//! Composes the item store, the prefix index and a result cache. Reads go
//! cache first, index on miss. Every write updates the index and then drops
//! the whole result cache so no stale prefix result outlives a mutation.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, Span};

use crate::cache::{LruCache, ResultCache, StatsSnapshot, TtlCache};
use crate::config::{CachePolicy, Config};
use crate::error::{CatalogError, Result};
use crate::index::PrefixIndex;
use crate::models::{Item, ItemRef, ItemSource};
use crate::store::{build_store, ItemStore};

/// Shared list of items returned by a prefix search.
pub type SearchResults = Arc<Vec<ItemRef>>;

/// Cache type used for search results.
pub type SearchCache = dyn ResultCache<String, Vec<ItemRef>>;

// == Search Service ==
/// Prefix search with cached results and invalidate-on-write.
///
/// Lock order is index, then store, then cache. Writers hold the index
/// write lock across their store mutation so index and store change together.
pub struct SearchService {
    store: Arc<dyn ItemStore>,
    index: RwLock<PrefixIndex>,
    cache: Box<SearchCache>,
    span: Span,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("strategy", &self.store.strategy())
            .field("cache_policy", &self.cache.policy_name())
            .field("indexed_paths", &self.index.read().size())
            .finish()
    }
}

impl SearchService {
    // == Constructor ==
    /// Wraps an existing store and indexes its current contents.
    pub fn new(store: Arc<dyn ItemStore>, cache: Box<SearchCache>) -> Self {
        let mut index = PrefixIndex::new();
        index.rebuild(store.all());

        Self {
            store,
            index: RwLock::new(index),
            cache,
            span: tracing::info_span!("search_service"),
        }
    }

    /// Builds store and cache from `config`.
    ///
    /// A TTL cache built here is purged lazily on access and on inserts at
    /// capacity; call [`TtlCache::start_maintenance`] on a cache passed to
    /// [`SearchService::new`] for periodic purging.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = build_store(config.store_strategy);
        let cache: Box<SearchCache> = match config.cache_policy {
            CachePolicy::Lru => Box::new(LruCache::new(config.cache_capacity)?),
            CachePolicy::Ttl => Box::new(TtlCache::new(config.ttl_cache_config())?),
        };
        Ok(Self::new(store, cache))
    }

    /// Replaces the span this service logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    // == Search ==
    /// Items whose title starts with `query` after trimming and lowercasing.
    pub fn search_by_prefix(&self, query: &str) -> SearchResults {
        let key = normalize(query);
        if let Some(hit) = self.cache.get(&key) {
            debug!(parent: &self.span, query = %key, results = hit.len(), "cache hit");
            return hit;
        }

        // The put happens under the index read lock, so a writer cannot
        // invalidate between our index read and our cache store.
        let index = self.index.read();
        let results: SearchResults = Arc::new(index.search_by_prefix(&key));
        self.cache.insert(key.clone(), Arc::clone(&results));
        drop(index);

        debug!(parent: &self.span, query = %key, results = results.len(), "cache miss, served from index");
        results
    }

    /// Like [`SearchService::search_by_prefix`], truncated to `limit` items.
    pub fn search_by_prefix_with_limit(&self, query: &str, limit: usize) -> Vec<ItemRef> {
        self.search_by_prefix(query)
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// True when any indexed title starts with `query`.
    pub fn has_prefix(&self, query: &str) -> bool {
        self.index.read().has_prefix(&normalize(query))
    }

    // == Writes ==
    /// Adds the item to the store and, if it was new, to the index.
    ///
    /// Returns `Ok(false)` with nothing changed when the id is taken.
    pub fn add_item(&self, item: Item) -> Result<bool> {
        let id = item.id().to_string();
        let mut index = self.index.write();
        if !self.store.add(item)? {
            return Ok(false);
        }

        // Index the stored handle so index and store share one allocation
        if let Some(stored) = self.store.find_by_id(&id) {
            index.insert(stored);
        }
        self.invalidate_locked(&index);
        drop(index);

        debug!(parent: &self.span, id = %id, "item added");
        Ok(true)
    }

    /// Replaces the stored value for an existing id and re-indexes it.
    pub fn update_item(&self, item: Item) -> Result<Option<ItemRef>> {
        let id = item.id().to_string();
        let mut index = self.index.write();
        let Some(previous) = self.store.update(item)? else {
            return Ok(None);
        };

        index.remove(&previous);
        if let Some(current) = self.store.find_by_id(&id) {
            index.insert(current);
        }
        self.invalidate_locked(&index);
        drop(index);

        debug!(parent: &self.span, id = %id, "item updated");
        Ok(Some(previous))
    }

    /// Removes the item from store and index.
    pub fn remove_item(&self, id: &str) -> Option<ItemRef> {
        let mut index = self.index.write();
        let removed = self.store.remove(id)?;

        index.remove(&removed);
        self.invalidate_locked(&index);
        drop(index);

        debug!(parent: &self.span, id, "item removed");
        Some(removed)
    }

    // == Refresh ==
    /// Rebuilds the index from a full store snapshot and clears the cache.
    pub fn refresh_index(&self) {
        let mut index = self.index.write();
        let count = self.rebuild_locked(&mut index);
        drop(index);

        info!(parent: &self.span, items = count, "index rebuilt");
    }

    /// Loads every item from `source` into the store, then rebuilds the index.
    ///
    /// Every item is validated first; one invalid item rejects the whole
    /// batch and nothing is stored. Items whose id is already stored are
    /// skipped. Returns how many were added.
    pub fn seed_from(&self, source: &dyn ItemSource) -> Result<usize> {
        let items = source
            .find_all()
            .map_err(|err| CatalogError::Internal(format!("item source failed: {:#}", err)))?;
        items.iter().try_for_each(Item::validate)?;

        let mut index = self.index.write();
        let mut added = 0;
        for item in items {
            if self.store.add(item)? {
                added += 1;
            }
        }
        let count = self.rebuild_locked(&mut index);
        drop(index);

        info!(parent: &self.span, added, items = count, "seeded from item source");
        Ok(added)
    }

    fn rebuild_locked(&self, index: &mut PrefixIndex) -> usize {
        let snapshot = self.store.all();
        let count = snapshot.len();
        index.rebuild(snapshot);
        self.invalidate_locked(index);
        count
    }

    // == Introspection ==
    pub fn cache_stats(&self) -> StatsSnapshot {
        self.cache.stats()
    }

    pub fn reset_cache_stats(&self) {
        self.cache.reset_stats();
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_policy(&self) -> &'static str {
        self.cache.policy_name()
    }

    /// Distinct indexed titles.
    pub fn indexed_paths(&self) -> usize {
        self.index.read().size()
    }

    /// Items reachable through the index.
    pub fn indexed_items(&self) -> usize {
        self.index.read().item_count()
    }

    /// Clears the cache. Takes the index guard to prove the caller holds the
    /// index write lock.
    fn invalidate_locked(&self, _index: &PrefixIndex) {
        let dropped = self.cache.len();
        self.cache.invalidate_all();
        debug!(parent: &self.span, dropped, "result cache invalidated");
    }
}

/// Trim + lowercase, the cache key for a query.
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}
