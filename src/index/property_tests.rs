//! Property-Based Tests for Index Module
//!
//! Uses proptest to check prefix membership and pruning.

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::index::PrefixIndex;
use crate::models::{Category, Item, ItemRef};

// == Strategies ==
/// Short titles over a tiny alphabet so paths overlap
fn title_strategy() -> impl Strategy<Value = String> {
    "[abAB ]{1,6}".prop_filter("title must not be blank", |s| !s.trim().is_empty())
}

fn prefix_strategy() -> impl Strategy<Value = String> {
    "[abAB ]{0,4}".prop_map(|s| s)
}

fn items_strategy() -> impl Strategy<Value = Vec<ItemRef>> {
    prop::collection::vec(title_strategy(), 1..25).prop_map(|titles| {
        titles
            .into_iter()
            .enumerate()
            .map(|(i, title)| {
                Arc::new(Item::new(format!("I{}", i), title, 1.0, 2000, Category::Book).unwrap())
            })
            .collect()
    })
}

fn index_of(items: &[ItemRef]) -> PrefixIndex {
    let mut index = PrefixIndex::new();
    for item in items {
        index.insert(ItemRef::clone(item));
    }
    index
}

fn id_set(items: &[ItemRef]) -> BTreeSet<String> {
    items.iter().map(|i| i.id().to_string()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // The empty prefix returns exactly the indexed set.
    #[test]
    fn prop_empty_prefix_returns_all(items in items_strategy()) {
        let index = index_of(&items);
        prop_assert_eq!(id_set(&index.search_by_prefix("")), id_set(&items));
        prop_assert_eq!(index.search_by_prefix("").len(), items.len());
    }

    // An item is returned iff the query is a case-insensitive prefix of its title.
    #[test]
    fn prop_prefix_membership(items in items_strategy(), prefix in prefix_strategy()) {
        let index = index_of(&items);
        let found = id_set(&index.search_by_prefix(&prefix));
        let lowered = prefix.to_lowercase();

        for item in &items {
            let expected = item.title().to_lowercase().starts_with(&lowered);
            prop_assert_eq!(found.contains(item.id()), expected, "title {:?} prefix {:?}", item.title(), prefix);
        }
    }

    // After removal no prefix of the title returns the item, and no empty
    // node remains reachable.
    #[test]
    fn prop_remove_prunes(items in items_strategy(), remove_mask in prop::collection::vec(any::<bool>(), 25)) {
        let mut index = index_of(&items);
        let (gone, kept): (Vec<_>, Vec<_>) = items
            .iter()
            .cloned()
            .enumerate()
            .partition(|(i, _)| remove_mask[*i]);

        for (_, item) in &gone {
            prop_assert!(index.remove(item));
        }

        prop_assert_eq!(index.empty_node_count(), 0);
        prop_assert_eq!(index.item_count(), kept.len());

        for (_, item) in &gone {
            let title: Vec<char> = item.title().chars().collect();
            for end in 0..=title.len() {
                let prefix: String = title[..end].iter().collect();
                let found = id_set(&index.search_by_prefix(&prefix));
                prop_assert!(!found.contains(item.id()));
            }
        }

        let distinct_titles: BTreeSet<String> =
            kept.iter().map(|(_, item)| item.title().to_lowercase()).collect();
        prop_assert_eq!(index.size(), distinct_titles.len());
    }
}
