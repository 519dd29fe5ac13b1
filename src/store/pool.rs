//! Bounded worker pool
//!
//! Runs blocking store calls on tokio's blocking threads. An admission
//! semaphore caps running plus waiting jobs, and a second one caps how many
//! run at once, so a flood of async calls queues up to a fixed depth and then
//! holds callers back instead of growing without bound.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn, Span};

use crate::error::{CatalogError, Result};

/// Total jobs a pool may admit, or `InvalidConfig` when the sizes are unusable.
pub(crate) fn admission_limit(workers: usize, queue_capacity: usize) -> Result<usize> {
    if workers == 0 {
        return Err(CatalogError::InvalidConfig(
            "worker pool needs at least one worker".to_string(),
        ));
    }
    workers
        .checked_add(queue_capacity)
        .filter(|total| *total <= Semaphore::MAX_PERMITS)
        .ok_or_else(|| {
            CatalogError::InvalidConfig(format!(
                "workers + queue capacity must not exceed {}",
                Semaphore::MAX_PERMITS
            ))
        })
}

// == Worker Pool ==
/// Cloning yields another handle to the same pool.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    admission: Arc<Semaphore>,
    running: Arc<Semaphore>,
    workers: usize,
    queue_capacity: usize,
    span: Span,
}

impl WorkerPool {
    // == Constructor ==
    /// Creates a pool running `workers` jobs at once with up to
    /// `queue_capacity` more waiting.
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self> {
        let admitted = admission_limit(workers, queue_capacity)?;

        Ok(Self {
            admission: Arc::new(Semaphore::new(admitted)),
            running: Arc::new(Semaphore::new(workers)),
            workers,
            queue_capacity,
            span: tracing::debug_span!("worker_pool", workers, queue_capacity),
        })
    }

    /// Replaces the span this pool logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Jobs admitted and not yet finished, running or waiting.
    pub fn in_flight(&self) -> usize {
        self.workers + self.queue_capacity - self.admission.available_permits()
    }

    // == Submit ==
    /// Runs `job` on the pool, waiting for room when the pool is full.
    ///
    /// Once admitted the job runs to completion even if the returned future
    /// is dropped. A panicking job resolves to `CatalogError::Internal` and
    /// leaves the pool usable.
    pub async fn submit<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let admitted = Arc::clone(&self.admission)
            .acquire_owned()
            .await
            .map_err(|_| CatalogError::Internal("worker pool closed".to_string()))?;
        self.dispatch(admitted, job).await
    }

    // == Try Submit ==
    /// Like [`WorkerPool::submit`] but fails at once with
    /// `CatalogError::PoolExhausted` when no room is left.
    ///
    /// The job is admitted before this returns; must be called from within a
    /// tokio runtime.
    pub fn try_submit<F, T>(&self, job: F) -> Result<impl Future<Output = Result<T>> + Send + 'static>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let admitted = Arc::clone(&self.admission).try_acquire_owned().map_err(|_| {
            debug!(parent: &self.span, "job rejected, pool saturated");
            CatalogError::PoolExhausted(format!(
                "{} jobs already admitted",
                self.workers + self.queue_capacity
            ))
        })?;
        Ok(self.dispatch(admitted, job))
    }

    fn dispatch<F, T>(
        &self,
        admitted: OwnedSemaphorePermit,
        job: F,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let running = Arc::clone(&self.running);
        let span = self.span.clone();

        let handle = tokio::spawn(async move {
            let _admitted = admitted;
            let _slot = running
                .acquire_owned()
                .await
                .map_err(|_| CatalogError::Internal("worker pool closed".to_string()))?;

            tokio::task::spawn_blocking(job).await.map_err(|err| {
                warn!(parent: &span, error = %err, "worker job failed");
                CatalogError::Internal(format!("worker job failed: {}", err))
            })
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(CatalogError::Internal(format!(
                    "worker task failed: {}",
                    err
                ))),
            }
        }
    }
}
