//! Cache Entry Module
//!
//! Defines the immutable snapshot stored for each key of the TTL cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A cached value with its access metadata.
///
/// Entries are never mutated. An access builds a new entry through
/// [`CacheEntry::touched`] and the cache swaps it in under its lock, so a
/// reader never sees a value paired with another value's timestamps.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: Arc<V>,
    /// When the value was loaded or put
    pub created_at: Instant,
    /// When the value was last returned to a caller
    pub last_access: Instant,
    /// Number of times the value was returned to a caller
    pub access_count: u64,
}

// Manual impl: cloning only bumps the Arc, so V need not be Clone.
impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            created_at: self.created_at,
            last_access: self.last_access,
            access_count: self.access_count,
        }
    }
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry created and accessed at `now`.
    pub fn new(value: Arc<V>, now: Instant) -> Self {
        Self {
            value,
            created_at: now,
            last_access: now,
            access_count: 0,
        }
    }

    // == Touched ==
    /// Returns the replacement entry recording one more access at `now`.
    pub fn touched(&self, now: Instant) -> Self {
        Self {
            value: Arc::clone(&self.value),
            created_at: self.created_at,
            last_access: now,
            access_count: self.access_count + 1,
        }
    }

    // == Is Expired ==
    /// Checks the entry against the cache's TTL and idle timeout.
    ///
    /// Boundary condition: an entry is expired once the elapsed time is
    /// greater than or equal to the limit.
    pub fn is_expired(
        &self,
        now: Instant,
        time_to_live: Option<Duration>,
        idle_timeout: Option<Duration>,
    ) -> bool {
        let too_old = time_to_live.is_some_and(|ttl| self.age(now) >= ttl);
        let too_idle = idle_timeout.is_some_and(|idle| self.idle_time(now) >= idle);
        too_old || too_idle
    }

    /// Time since the entry was created.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Time since the entry was last read.
    pub fn idle_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_access)
    }

    /// Remaining lifetime under `time_to_live`, zero once expired.
    pub fn ttl_remaining(&self, now: Instant, time_to_live: Duration) -> Duration {
        time_to_live.saturating_sub(self.age(now))
    }
}
