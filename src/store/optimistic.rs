//! Optimistic-read store
//!
//! Writers go through the exclusive lock and move the version stamp to an odd
//! value while they mutate and back to even when done. Readers check the
//! stamp, then take the lock with a non-blocking `try_read`. A successful
//! `try_read` is the validation: no writer can run while it is held, so the
//! read cannot observe a torn state. A reader that sees an odd stamp or
//! cannot get the lock without waiting falls back to one blocking read.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, trace, Span};

use super::{collect_sorted, ItemStore};
use crate::config::StoreStrategy;
use crate::error::Result;
use crate::models::{Item, ItemRef};

/// Counters describing how reads were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    /// Reads validated on the fast path
    pub optimistic: u64,
    /// Reads that fell back to a blocking lock
    pub fallback: u64,
}

// == Optimistic Store ==
#[derive(Debug)]
pub struct OptimisticStore {
    items: RwLock<HashMap<String, ItemRef>>,
    version: AtomicU64,
    optimistic_reads: AtomicU64,
    fallback_reads: AtomicU64,
    span: Span,
}

impl Default for OptimisticStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimisticStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            version: AtomicU64::new(0),
            optimistic_reads: AtomicU64::new(0),
            fallback_reads: AtomicU64::new(0),
            span: tracing::debug_span!("item_store", strategy = "optimistic"),
        }
    }

    /// Replaces the span this store logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Current write stamp. Even when no writer is active.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn read_stats(&self) -> ReadStats {
        ReadStats {
            optimistic: self.optimistic_reads.load(Ordering::Relaxed),
            fallback: self.fallback_reads.load(Ordering::Relaxed),
        }
    }

    // == Read ==
    fn read<R>(&self, f: impl Fn(&HashMap<String, ItemRef>) -> R) -> R {
        let stamp = self.version.load(Ordering::Acquire);
        if stamp % 2 == 0 {
            if let Some(items) = self.items.try_read() {
                self.optimistic_reads.fetch_add(1, Ordering::Relaxed);
                return f(&items);
            }
        }

        self.fallback_reads.fetch_add(1, Ordering::Relaxed);
        trace!(parent: &self.span, stamp, "writer active, falling back to locked read");
        let items = self.items.read();
        f(&items)
    }

    // == Write ==
    fn write<R>(&self, f: impl FnOnce(&mut HashMap<String, ItemRef>) -> R) -> R {
        let mut items = self.items.write();
        self.version.fetch_add(1, Ordering::AcqRel);
        let result = f(&mut items);
        self.version.fetch_add(1, Ordering::Release);
        result
    }
}

impl ItemStore for OptimisticStore {
    fn add(&self, item: Item) -> Result<bool> {
        item.validate()?;
        let id = item.id().to_string();
        let added = self.write(|items| match items.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(item));
                true
            }
        });

        if added {
            debug!(parent: &self.span, id, "item added");
        } else {
            debug!(parent: &self.span, id, "add rejected, id already present");
        }
        Ok(added)
    }

    fn update(&self, item: Item) -> Result<Option<ItemRef>> {
        item.validate()?;
        Ok(self.write(|items| {
            items
                .get_mut(item.id())
                .map(|slot| std::mem::replace(slot, Arc::new(item)))
        }))
    }

    fn remove(&self, id: &str) -> Option<ItemRef> {
        let removed = self.write(|items| items.remove(id));
        if removed.is_some() {
            debug!(parent: &self.span, id, "item removed");
        }
        removed
    }

    fn find_by_id(&self, id: &str) -> Option<ItemRef> {
        self.read(|items| items.get(id).cloned())
    }

    fn contains(&self, id: &str) -> bool {
        self.read(|items| items.contains_key(id))
    }

    fn filter(&self, predicate: &dyn Fn(&Item) -> bool) -> Vec<ItemRef> {
        self.read(|items| collect_sorted(items.values(), predicate))
    }

    fn clear(&self) {
        let dropped = self.write(|items| {
            let dropped = items.len();
            items.clear();
            dropped
        });
        debug!(parent: &self.span, dropped, "store cleared");
    }

    fn len(&self) -> usize {
        self.read(|items| items.len())
    }

    fn strategy(&self) -> StoreStrategy {
        StoreStrategy::Optimistic
    }
}
