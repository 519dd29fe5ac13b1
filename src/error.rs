//! Error types for the catalog core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Catalog Error Enum ==
/// Unified error type for the store, index, caches and worker pool.
///
/// Lookups of absent ids are not errors; they come back as `None` or `false`.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed item or call argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Rejected construction parameters (capacity, TTL, pool sizes)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A cache loader failed; nothing was cached for the key
    #[error("Load failed for key {key}: {source}")]
    LoadFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The worker pool is saturated and the caller asked not to wait
    #[error("Worker pool exhausted: {0}")]
    PoolExhausted(String),

    /// A background job panicked or could not be joined
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    /// Builds a `LoadFailed` from any debuggable key.
    pub(crate) fn load_failed<K: std::fmt::Debug>(key: &K, source: anyhow::Error) -> Self {
        CatalogError::LoadFailed {
            key: format!("{:?}", key),
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the catalog core.
pub type Result<T> = std::result::Result<T, CatalogError>;
