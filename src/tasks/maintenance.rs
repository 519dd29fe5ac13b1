//! TTL Maintenance Task
//!
//! Background task that periodically removes expired result-cache entries.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TtlCache;

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task sleeps for `interval` between runs and goes through
/// [`TtlCache::purge_expired`], the same locked entry point foreground calls
/// use. It only holds a weak handle, so it ends on its own once the last
/// owner of the cache is dropped.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = TtlCache::new(TtlCacheConfig::default())?;
/// let maintenance = spawn_maintenance_task(&cache, Duration::from_secs(1));
/// // Later, during shutdown:
/// maintenance.abort();
/// ```
pub fn spawn_maintenance_task<K, V>(cache: &TtlCache<K, V>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let weak = cache.downgrade();

    tokio::spawn(async move {
        let span = weak.span().clone();
        info!(
            parent: &span,
            "Starting TTL maintenance task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = match weak.upgrade() {
                Some(cache) => cache.purge_expired(),
                None => {
                    info!(parent: &span, "Result cache dropped, stopping TTL maintenance task");
                    break;
                }
            };

            if removed > 0 {
                info!(parent: &span, "TTL maintenance: removed {} expired entries", removed);
            } else {
                debug!(parent: &span, "TTL maintenance: no expired entries found");
            }
        }
    })
}
