//! Trie over lowercase titles
//!
//! Each item sits at the node reached by the characters of its lowercase
//! title and nowhere else. Removal prunes nodes left without children and
//! items, walking back toward the root, so memory stays bounded under churn.
//!
//! The index is not synchronized; callers serialize mutation.

use std::collections::BTreeMap;

use crate::models::{Item, ItemRef};

// == Trie Node ==
#[derive(Debug, Default)]
pub struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    /// Items whose lowercase title ends here, keyed by id
    items: BTreeMap<String, ItemRef>,
}

impl TrieNode {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.items.is_empty()
    }

    /// Depth-first collection: own items first, then children in char order.
    /// Returns false once `limit` items have been gathered.
    fn collect_into(&self, out: &mut Vec<ItemRef>, limit: usize) -> bool {
        for item in self.items.values() {
            if out.len() >= limit {
                return false;
            }
            out.push(ItemRef::clone(item));
        }
        for child in self.children.values() {
            if !child.collect_into(out, limit) {
                return false;
            }
        }
        out.len() < limit
    }

    fn node_count(&self) -> usize {
        1 + self.children.values().map(TrieNode::node_count).sum::<usize>()
    }

    fn empty_descendants(&self) -> usize {
        self.children
            .values()
            .map(|child| usize::from(child.is_empty()) + child.empty_descendants())
            .sum()
    }
}

/// Outcome of removing an id from the subtree below a node.
struct Removal {
    removed: bool,
    /// The terminal node lost its last item
    path_emptied: bool,
}

fn remove_along(node: &mut TrieNode, path: &[char], id: &str) -> Removal {
    let Some((first, rest)) = path.split_first() else {
        let removed = node.items.remove(id).is_some();
        return Removal {
            removed,
            path_emptied: removed && node.items.is_empty(),
        };
    };

    let Some(child) = node.children.get_mut(first) else {
        return Removal {
            removed: false,
            path_emptied: false,
        };
    };

    let outcome = remove_along(child, rest, id);
    if child.is_empty() {
        node.children.remove(first);
    }
    outcome
}

// == Prefix Index ==
/// Prefix search over item titles.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    root: TrieNode,
    terminal_paths: usize,
    item_count: usize,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Indexes the item under its lowercase title.
    ///
    /// Re-inserting an id on the same path replaces the stored handle. An id
    /// re-inserted under a different title must be removed first.
    pub fn insert(&mut self, item: ItemRef) {
        let mut node = &mut self.root;
        for ch in item.normalized_title().chars() {
            node = node.children.entry(ch).or_default();
        }

        if node.items.is_empty() {
            self.terminal_paths += 1;
        }
        if node.items.insert(item.id().to_string(), item).is_none() {
            self.item_count += 1;
        }
    }

    // == Search ==
    /// Every item whose title starts with `prefix`, ignoring case.
    ///
    /// An empty prefix returns every indexed item.
    pub fn search_by_prefix(&self, prefix: &str) -> Vec<ItemRef> {
        self.search_by_prefix_with_limit(prefix, usize::MAX)
    }

    /// Like [`PrefixIndex::search_by_prefix`], stopping after `limit` items.
    pub fn search_by_prefix_with_limit(&self, prefix: &str, limit: usize) -> Vec<ItemRef> {
        let mut out = Vec::new();
        if limit == 0 {
            return out;
        }
        if let Some(node) = self.find_node(&prefix.to_lowercase()) {
            node.collect_into(&mut out, limit);
        }
        out
    }

    /// True when some indexed title starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.find_node(&prefix.to_lowercase()).is_some()
    }

    fn find_node(&self, lowered: &str) -> Option<&TrieNode> {
        lowered
            .chars()
            .try_fold(&self.root, |node, ch| node.children.get(&ch))
    }

    // == Remove ==
    /// Removes the item from its title path and prunes emptied nodes.
    ///
    /// Returns whether the item was indexed.
    pub fn remove(&mut self, item: &Item) -> bool {
        let path: Vec<char> = item.normalized_title().chars().collect();
        let outcome = remove_along(&mut self.root, &path, item.id());

        if outcome.removed {
            self.item_count -= 1;
        }
        if outcome.path_emptied {
            self.terminal_paths -= 1;
        }
        outcome.removed
    }

    // == Rebuild ==
    /// Drops everything and indexes `items` from scratch.
    pub fn rebuild<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = ItemRef>,
    {
        self.clear();
        for item in items {
            self.insert(item);
        }
    }

    pub fn clear(&mut self) {
        self.root = TrieNode::default();
        self.terminal_paths = 0;
        self.item_count = 0;
    }

    /// Distinct terminal paths, i.e. distinct lowercase titles.
    pub fn size(&self) -> usize {
        self.terminal_paths
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Nodes reachable from the root, root included.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Non-root nodes with neither children nor items. Zero after any
    /// sequence of inserts and removes.
    pub fn empty_node_count(&self) -> usize {
        self.root.empty_descendants()
    }
}
