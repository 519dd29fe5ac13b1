//! Index Module
//!
//! Trie-backed prefix index over item titles.

mod trie;

#[cfg(test)]
mod property_tests;

pub use trie::{PrefixIndex, TrieNode};
