//! Async store surface
//!
//! Future-returning forms of every [`ItemStore`] operation, executed on a
//! bounded [`WorkerPool`]. Each future resolves with what the synchronous call
//! would have returned; pool failures resolve to an error instead of
//! panicking the caller.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::models::{Item, ItemRef};
use crate::store::{build_store, ItemStore, WorkerPool};

// == Async Item Store ==
/// Cloning yields another handle to the same store and pool.
#[derive(Clone)]
pub struct AsyncItemStore {
    store: Arc<dyn ItemStore>,
    pool: WorkerPool,
}

impl std::fmt::Debug for AsyncItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncItemStore")
            .field("strategy", &self.store.strategy())
            .field("pool", &self.pool)
            .finish()
    }
}

impl AsyncItemStore {
    pub fn new(store: Arc<dyn ItemStore>, pool: WorkerPool) -> Self {
        Self { store, pool }
    }

    /// Builds the store and pool described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.worker_threads, config.worker_queue_capacity)?;
        Ok(Self::new(build_store(config.store_strategy), pool))
    }

    /// The synchronous store behind this surface.
    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    async fn run<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn ItemStore) -> T + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        self.pool.submit(move || op(store.as_ref())).await
    }

    // == Writes ==
    /// Validated before dispatch, so an invalid item never takes a worker.
    pub async fn add(&self, item: Item) -> Result<bool> {
        item.validate()?;
        self.run(move |store| store.add(item)).await?
    }

    pub async fn update(&self, item: Item) -> Result<Option<ItemRef>> {
        item.validate()?;
        self.run(move |store| store.update(item)).await?
    }

    pub async fn remove(&self, id: impl Into<String>) -> Result<Option<ItemRef>> {
        let id = id.into();
        self.run(move |store| store.remove(&id)).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.run(|store| store.clear()).await
    }

    // == Reads ==
    pub async fn find_by_id(&self, id: impl Into<String>) -> Result<Option<ItemRef>> {
        let id = id.into();
        self.run(move |store| store.find_by_id(&id)).await
    }

    pub async fn contains(&self, id: impl Into<String>) -> Result<bool> {
        let id = id.into();
        self.run(move |store| store.contains(&id)).await
    }

    pub async fn search_by_title(&self, fragment: impl Into<String>) -> Result<Vec<ItemRef>> {
        let fragment = fragment.into();
        self.run(move |store| store.search_by_title(&fragment)).await
    }

    pub async fn search_by_creator(&self, name: impl Into<String>) -> Result<Vec<ItemRef>> {
        let name = name.into();
        self.run(move |store| store.search_by_creator(&name)).await
    }

    pub async fn filter<P>(&self, predicate: P) -> Result<Vec<ItemRef>>
    where
        P: Fn(&Item) -> bool + Send + 'static,
    {
        self.run(move |store| store.filter(&predicate)).await
    }

    pub async fn find_by_price_range(&self, min: f64, max: f64) -> Result<Vec<ItemRef>> {
        self.run(move |store| store.find_by_price_range(min, max)).await
    }

    pub async fn find_by_year_range(&self, from: i32, to: i32) -> Result<Vec<ItemRef>> {
        self.run(move |store| store.find_by_year_range(from, to)).await
    }

    pub async fn all(&self) -> Result<Vec<ItemRef>> {
        self.run(|store| store.all()).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.run(|store| store.len()).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        self.run(|store| store.is_empty()).await
    }
}
