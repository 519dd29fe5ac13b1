//! Configuration Module
//!
//! Handles loading and validating catalog configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::TtlCacheConfig;
use crate::error::{CatalogError, Result};
use crate::store::admission_limit;

// == Store Strategy ==
/// Concurrency strategy used by the item store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStrategy {
    /// Read-write lock, readers in parallel, writers exclusive
    Locked,
    /// Stamp-validated reads with a blocking fallback
    Optimistic,
}

impl FromStr for StoreStrategy {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "locked" | "rwlock" => Ok(StoreStrategy::Locked),
            "optimistic" | "stamped" => Ok(StoreStrategy::Optimistic),
            other => Err(CatalogError::InvalidConfig(format!(
                "unknown store strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for StoreStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStrategy::Locked => write!(f, "locked"),
            StoreStrategy::Optimistic => write!(f, "optimistic"),
        }
    }
}

// == Cache Policy ==
/// Eviction policy used by the search result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Fixed-capacity LRU
    Lru,
    /// Size bound plus time-to-live and idle expiry
    Ttl,
}

impl FromStr for CachePolicy {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(CachePolicy::Lru),
            "ttl" => Ok(CachePolicy::Ttl),
            other => Err(CatalogError::InvalidConfig(format!(
                "unknown cache policy '{}'",
                other
            ))),
        }
    }
}

/// Catalog configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Item store concurrency strategy
    pub store_strategy: StoreStrategy,
    /// Number of jobs the async worker pool runs at once
    pub worker_threads: usize,
    /// Number of jobs allowed to wait for a worker before callers are held back
    pub worker_queue_capacity: usize,
    /// Result cache policy
    pub cache_policy: CachePolicy,
    /// Maximum number of cached query results
    pub cache_capacity: usize,
    /// Time-to-live in seconds for cached results (ttl policy only)
    pub cache_ttl_secs: u64,
    /// Idle timeout in seconds, 0 disables it (ttl policy only)
    pub cache_idle_secs: u64,
    /// Background maintenance interval in seconds
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CATALOG_STORE_STRATEGY` - `locked` or `optimistic` (default: optimistic)
    /// - `CATALOG_WORKER_THREADS` - Concurrent async jobs (default: 4)
    /// - `CATALOG_WORKER_QUEUE` - Waiting async jobs (default: 256)
    /// - `CATALOG_CACHE_POLICY` - `lru` or `ttl` (default: lru)
    /// - `CATALOG_CACHE_CAPACITY` - Cached query results (default: 1000)
    /// - `CATALOG_CACHE_TTL` - Result TTL in seconds (default: 300)
    /// - `CATALOG_CACHE_IDLE` - Result idle timeout in seconds (default: 0, disabled)
    /// - `CATALOG_CLEANUP_INTERVAL` - Maintenance frequency in seconds (default: 1)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_strategy: parse_var("CATALOG_STORE_STRATEGY").unwrap_or(defaults.store_strategy),
            worker_threads: parse_var("CATALOG_WORKER_THREADS").unwrap_or(defaults.worker_threads),
            worker_queue_capacity: parse_var("CATALOG_WORKER_QUEUE")
                .unwrap_or(defaults.worker_queue_capacity),
            cache_policy: parse_var("CATALOG_CACHE_POLICY").unwrap_or(defaults.cache_policy),
            cache_capacity: parse_var("CATALOG_CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),
            cache_ttl_secs: parse_var("CATALOG_CACHE_TTL").unwrap_or(defaults.cache_ttl_secs),
            cache_idle_secs: parse_var("CATALOG_CACHE_IDLE").unwrap_or(defaults.cache_idle_secs),
            cleanup_interval_secs: parse_var("CATALOG_CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval_secs),
        }
    }

    /// Rejects zero-sized pools and caches, and pool sizes the semaphore
    /// cannot hold.
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(CatalogError::InvalidConfig(
                "worker_threads must be positive".to_string(),
            ));
        }
        admission_limit(self.worker_threads, self.worker_queue_capacity)?;
        if self.cache_capacity == 0 {
            return Err(CatalogError::InvalidConfig(
                "cache_capacity must be positive".to_string(),
            ));
        }
        if self.cache_policy == CachePolicy::Ttl && self.cache_ttl_secs == 0 {
            return Err(CatalogError::InvalidConfig(
                "cache_ttl_secs must be positive".to_string(),
            ));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(CatalogError::InvalidConfig(
                "cleanup_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for a TTL result cache built from this config.
    pub fn ttl_cache_config(&self) -> TtlCacheConfig {
        TtlCacheConfig {
            max_entries: self.cache_capacity,
            time_to_live: Some(Duration::from_secs(self.cache_ttl_secs)),
            idle_timeout: match self.cache_idle_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            cleanup_interval: Duration::from_secs(self.cleanup_interval_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_strategy: StoreStrategy::Optimistic,
            worker_threads: 4,
            worker_queue_capacity: 256,
            cache_policy: CachePolicy::Lru,
            cache_capacity: 1000,
            cache_ttl_secs: 300,
            cache_idle_secs: 0,
            cleanup_interval_secs: 1,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
