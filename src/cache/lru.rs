//! LRU Tracker Module
//!
//! Generic O(1) recency order shared by both cache policies.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys live in an arena-backed doubly linked list where:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// A key -> slot map makes `touch`, `remove` and `evict_oldest` O(1).
/// Freed slots are recycled so the arena never grows past the peak key count.
#[derive(Debug)]
pub struct LruTracker<K> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
        }
    }
}

impl<K: Eq + Hash + Clone> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    ///
    /// If key exists, unlinks it then relinks at the front.
    /// If key is new, just adds to front.
    pub fn touch<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(&idx) = self.index.get(key) {
            self.unlink(idx);
            self.push_front(idx);
            return;
        }

        let owned = key.to_owned();
        let node = Node {
            key: owned.clone(),
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(owned, idx);
        self.push_front(idx);
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns whether it was tracked.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.remove(key) {
            Some(idx) => {
                self.unlink(idx);
                self.release(idx);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let idx = self.tail?;
        self.unlink(idx);
        let node = self.release(idx)?;
        self.index.remove(&node.key);
        Some(node.key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.tail
            .and_then(|idx| self.slots[idx].as_ref())
            .map(|node| &node.key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    // == Clear ==
    /// Forgets every tracked key.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.slots[h].as_mut() {
                    node.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn release(&mut self, idx: usize) -> Option<Node<K>> {
        let node = self.slots[idx].take();
        if node.is_some() {
            self.free.push(idx);
        }
        node
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru: LruTracker<String> = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_new_key() {
        let mut lru = LruTracker::<String>::new();

        lru.touch("java");
        lru.touch("rust");
        lru.touch("kotlin");

        assert_eq!(lru.len(), 3);
        // key1 is oldest (added first)
        assert_eq!(lru.peek_oldest(), Some(&"java".to_string()));
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::<String>::new();

        lru.touch("java");
        lru.touch("rust");
        lru.touch("kotlin");

        // Touch key1 again - should move to front
        lru.touch("java");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&"rust".to_string()));
    }

    #[test]
    fn test_lru_evict_oldest() {
        let mut lru = LruTracker::<String>::new();

        lru.touch("java");
        lru.touch("rust");
        lru.touch("kotlin");

        assert_eq!(lru.evict_oldest(), Some("java".to_string()));
        assert_eq!(lru.len(), 2);

        assert_eq!(lru.evict_oldest(), Some("rust".to_string()));
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut lru = LruTracker::<u32>::new();
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::<String>::new();

        lru.touch("java");
        lru.touch("rust");
        lru.touch("kotlin");

        assert!(lru.remove("rust"));
        assert!(!lru.remove("rust"));

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("rust"));
        assert!(lru.contains("java"));
        assert!(lru.contains("kotlin"));
        assert_eq!(lru.evict_oldest(), Some("java".to_string()));
        assert_eq!(lru.evict_oldest(), Some("kotlin".to_string()));
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruTracker::<String>::new();

        // touch(a), touch(b), touch(c): [c, b, a]
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        // touch(a): [a, c, b], touch(c): [c, a, b], touch(b): [b, c, a]
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::<String>::new();

        lru.touch("java");
        lru.touch("java");
        lru.touch("java");

        // Should only have one entry
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("java".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_slots_are_recycled() {
        let mut lru = LruTracker::<u32>::new();

        for round in 0..10u32 {
            lru.touch(&round);
            lru.touch(&(round + 100));
            lru.remove(&round);
            lru.evict_oldest();
        }

        assert!(lru.is_empty());
        assert!(lru.slots.len() <= 2, "arena grew to {}", lru.slots.len());
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::<String>::new();
        lru.touch("a");
        lru.touch("b");
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);

        lru.touch("c");
        assert_eq!(lru.peek_oldest(), Some(&"c".to_string()));
    }
}
