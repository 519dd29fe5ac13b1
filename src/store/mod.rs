//! Item Store Module
//!
//! Concurrency-safe keyed collection of catalog items with two interchangeable
//! locking strategies and an async surface backed by a bounded worker pool.

mod async_store;
mod locked;
mod optimistic;
mod pool;


use std::sync::Arc;

use crate::config::StoreStrategy;
use crate::error::Result;
use crate::models::{Item, ItemRef};

pub use async_store::AsyncItemStore;
pub use locked::LockedStore;
pub use optimistic::{OptimisticStore, ReadStats};
pub use pool::WorkerPool;
pub(crate) use pool::admission_limit;

// == Item Store ==
/// Contract shared by every store strategy.
///
/// Writes to one id are serialized by the strategy's exclusive path. Bulk
/// queries return point-in-time snapshots sorted by id. Absent ids are
/// reported as `None`/`false`, never as errors.
pub trait ItemStore: Send + Sync {
    /// Inserts the item unless its id is taken. Returns `Ok(false)` and
    /// leaves the store untouched on a duplicate id.
    fn add(&self, item: Item) -> Result<bool>;

    /// Swaps in a new value for an existing id and returns the old one.
    /// Returns `Ok(None)` and changes nothing when the id is absent.
    fn update(&self, item: Item) -> Result<Option<ItemRef>>;

    fn remove(&self, id: &str) -> Option<ItemRef>;

    fn find_by_id(&self, id: &str) -> Option<ItemRef>;

    fn contains(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Items matching `predicate`, sorted by id.
    fn filter(&self, predicate: &dyn Fn(&Item) -> bool) -> Vec<ItemRef>;

    /// Case-insensitive substring match on titles.
    fn search_by_title(&self, fragment: &str) -> Vec<ItemRef> {
        let needle = fragment.to_lowercase();
        self.filter(&|item| item.title().to_lowercase().contains(&needle))
    }

    /// Case-insensitive substring match on creators.
    fn search_by_creator(&self, name: &str) -> Vec<ItemRef> {
        let needle = name.to_lowercase();
        self.filter(&|item| item.creator().to_lowercase().contains(&needle))
    }

    /// Items priced within `[min, max]`. Empty when `min > max`.
    fn find_by_price_range(&self, min: f64, max: f64) -> Vec<ItemRef> {
        self.filter(&|item| item.price() >= min && item.price() <= max)
    }

    /// Items published within `[from, to]`. Empty when `from > to`.
    fn find_by_year_range(&self, from: i32, to: i32) -> Vec<ItemRef> {
        self.filter(&|item| (from..=to).contains(&item.year()))
    }

    /// Snapshot of every item, sorted by id.
    fn all(&self) -> Vec<ItemRef> {
        self.filter(&|_| true)
    }

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn strategy(&self) -> StoreStrategy;
}

/// Builds a store for the configured strategy.
pub fn build_store(strategy: StoreStrategy) -> Arc<dyn ItemStore> {
    match strategy {
        StoreStrategy::Locked => Arc::new(LockedStore::new()),
        StoreStrategy::Optimistic => Arc::new(OptimisticStore::new()),
    }
}

/// Collects matching items sorted by id.
fn collect_sorted<'a, I>(items: I, predicate: &dyn Fn(&Item) -> bool) -> Vec<ItemRef>
where
    I: Iterator<Item = &'a ItemRef>,
{
    let mut matches: Vec<ItemRef> = items
        .filter(|item| predicate(item))
        .cloned()
        .collect();
    matches.sort_by(|a, b| a.id().cmp(b.id()));
    matches
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::models::Category;
    use std::thread;

    pub(crate) fn item(id: &str, title: &str, price: f64, year: i32) -> Item {
        Item::new(id, title, price, year, Category::Book).unwrap()
    }

    fn stores() -> Vec<Arc<dyn ItemStore>> {
        vec![
            build_store(StoreStrategy::Locked),
            build_store(StoreStrategy::Optimistic),
        ]
    }

    #[test]
    fn test_build_store_strategy() {
        assert_eq!(build_store(StoreStrategy::Locked).strategy(), StoreStrategy::Locked);
        assert_eq!(
            build_store(StoreStrategy::Optimistic).strategy(),
            StoreStrategy::Optimistic
        );
    }

    #[test]
    fn test_add_find_remove() {
        for store in stores() {
            assert!(store.is_empty());
            assert!(store.add(item("A1", "Java Basics", 10.0, 2001)).unwrap());
            assert_eq!(store.len(), 1);
            assert!(store.contains("A1"));
            assert_eq!(store.find_by_id("A1").unwrap().title(), "Java Basics");

            let removed = store.remove("A1").unwrap();
            assert_eq!(removed.id(), "A1");
            assert!(store.remove("A1").is_none());
            assert!(store.find_by_id("A1").is_none());
            assert!(store.is_empty());
        }
    }

    #[test]
    fn test_duplicate_add_leaves_store_unchanged() {
        for store in stores() {
            store.add(item("A1", "Java Basics", 10.0, 2001)).unwrap();
            let before = store.all();

            let added = store.add(item("A1", "Something Else", 99.0, 1999)).unwrap();

            assert!(!added);
            assert_eq!(store.all(), before);
            assert_eq!(store.find_by_id("A1").unwrap().title(), "Java Basics");
        }
    }

    #[test]
    fn test_invalid_item_rejected_without_mutation() {
        for store in stores() {
            let bad: Item = serde_json::from_str(
                r#"{"id":"X","title":"","price":1.0,"year":2000,"category":"book"}"#,
            )
            .unwrap();

            assert!(matches!(store.add(bad.clone()), Err(CatalogError::InvalidArgument(_))));
            assert!(matches!(store.update(bad), Err(CatalogError::InvalidArgument(_))));
            assert!(store.is_empty());
        }
    }

    #[test]
    fn test_update_swaps_value() {
        for store in stores() {
            assert!(store.update(item("A1", "Ghost", 1.0, 2000)).unwrap().is_none());
            assert!(store.is_empty());

            store.add(item("A1", "Java Basics", 10.0, 2001)).unwrap();
            let previous = store.update(item("A1", "Java Basics 2nd Ed", 12.0, 2005)).unwrap();

            assert_eq!(previous.unwrap().title(), "Java Basics");
            assert_eq!(store.find_by_id("A1").unwrap().title(), "Java Basics 2nd Ed");
            assert_eq!(store.len(), 1);
        }
    }

    #[test]
    fn test_bulk_queries() {
        for store in stores() {
            store
                .add(item("B2", "The Rust Book", 30.0, 2018).with_creator("Steve Klabnik"))
                .unwrap();
            store
                .add(item("B1", "Programming Rust", 45.0, 2021).with_creator("Jim Blandy"))
                .unwrap();
            store
                .add(item("B3", "Java Concurrency", 50.0, 2006).with_creator("Brian Goetz"))
                .unwrap();

            let ids = |items: Vec<ItemRef>| items.iter().map(|i| i.id().to_string()).collect::<Vec<_>>();

            assert_eq!(ids(store.search_by_title("rust")), vec!["B1", "B2"]);
            assert_eq!(ids(store.search_by_creator("GOETZ")), vec!["B3"]);
            assert_eq!(ids(store.find_by_price_range(30.0, 45.0)), vec!["B1", "B2"]);
            assert!(store.find_by_price_range(50.0, 10.0).is_empty());
            assert_eq!(ids(store.find_by_year_range(2010, 2030)), vec!["B1", "B2"]);
            assert_eq!(ids(store.filter(&|i| i.year() < 2010)), vec!["B3"]);
            assert_eq!(ids(store.all()), vec!["B1", "B2", "B3"]);

            store.clear();
            assert!(store.is_empty());
        }
    }

    #[test]
    fn test_snapshots_are_point_in_time() {
        for store in stores() {
            store.add(item("A1", "Alpha", 1.0, 2000)).unwrap();
            let snapshot = store.all();
            store.add(item("A2", "Beta", 1.0, 2000)).unwrap();
            store.remove("A1");

            assert_eq!(snapshot.len(), 1);
            assert_eq!(snapshot[0].id(), "A1");
        }
    }

    #[test]
    fn test_concurrent_distinct_adds_lose_nothing() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 250;

        for store in stores() {
            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..PER_THREAD {
                            let id = format!("T{}-{}", t, i);
                            assert!(store.add(item(&id, "Concurrent", 1.0, 2000)).unwrap());
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(store.len(), THREADS * PER_THREAD);
        }
    }

    #[test]
    fn test_concurrent_same_id_adds_exactly_one_wins() {
        for store in stores() {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        store
                            .add(item("SAME", &format!("Writer {}", t), 1.0, 2000))
                            .unwrap()
                    })
                })
                .collect();

            let winners = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|added| *added)
                .count();

            assert_eq!(winners, 1);
            assert_eq!(store.len(), 1);
        }
    }
}
