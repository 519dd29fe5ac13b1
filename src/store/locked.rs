//! Coarse-grained store
//!
//! One read-write lock over the whole map: readers run in parallel, writers
//! are exclusive.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, Span};

use super::{collect_sorted, ItemStore};
use crate::config::StoreStrategy;
use crate::error::Result;
use crate::models::{Item, ItemRef};

// == Locked Store ==
#[derive(Debug)]
pub struct LockedStore {
    items: RwLock<HashMap<String, ItemRef>>,
    span: Span,
}

impl Default for LockedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LockedStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            span: tracing::debug_span!("item_store", strategy = "locked"),
        }
    }

    /// Replaces the span this store logs under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl ItemStore for LockedStore {
    fn add(&self, item: Item) -> Result<bool> {
        item.validate()?;
        let mut items = self.items.write();
        match items.entry(item.id().to_string()) {
            Entry::Occupied(_) => {
                debug!(parent: &self.span, id = item.id(), "add rejected, id already present");
                Ok(false)
            }
            Entry::Vacant(slot) => {
                debug!(parent: &self.span, id = item.id(), "item added");
                slot.insert(Arc::new(item));
                Ok(true)
            }
        }
    }

    fn update(&self, item: Item) -> Result<Option<ItemRef>> {
        item.validate()?;
        let mut items = self.items.write();
        Ok(items
            .get_mut(item.id())
            .map(|slot| std::mem::replace(slot, Arc::new(item))))
    }

    fn remove(&self, id: &str) -> Option<ItemRef> {
        let removed = self.items.write().remove(id);
        if removed.is_some() {
            debug!(parent: &self.span, id, "item removed");
        }
        removed
    }

    fn find_by_id(&self, id: &str) -> Option<ItemRef> {
        self.items.read().get(id).cloned()
    }

    fn contains(&self, id: &str) -> bool {
        self.items.read().contains_key(id)
    }

    fn filter(&self, predicate: &dyn Fn(&Item) -> bool) -> Vec<ItemRef> {
        collect_sorted(self.items.read().values(), predicate)
    }

    fn clear(&self) {
        let mut items = self.items.write();
        debug!(parent: &self.span, dropped = items.len(), "store cleared");
        items.clear();
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn strategy(&self) -> StoreStrategy {
        StoreStrategy::Locked
    }
}
