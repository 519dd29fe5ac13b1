//! Catalog Search - an in-memory item catalog with cached prefix search
//!
//! Items live in a thread-safe store (lock-based or optimistic-read), titles
//! are indexed in a trie, and prefix results are cached under an LRU or a
//! size + TTL policy.

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod search;
pub mod store;
pub mod tasks;

pub use cache::{LruCache, ResultCache, StatsSnapshot, TtlCache, TtlCacheConfig};
pub use config::{CachePolicy, Config, StoreStrategy};
pub use error::{CatalogError, Result};
pub use index::PrefixIndex;
pub use models::{Category, Item, ItemRef, ItemSource};
pub use search::SearchService;
pub use store::{build_store, AsyncItemStore, ItemStore, LockedStore, OptimisticStore, WorkerPool};
pub use tasks::spawn_maintenance_task;
