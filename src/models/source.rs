//! Item source seam
//!
//! Persistence lives outside this crate. The core only needs a full listing of
//! stored items to seed or rebuild its in-memory state.

use super::Item;

/// Anything that can list every persisted item.
pub trait ItemSource {
    /// Returns every item the source knows about.
    fn find_all(&self) -> anyhow::Result<Vec<Item>>;
}

impl ItemSource for Vec<Item> {
    fn find_all(&self) -> anyhow::Result<Vec<Item>> {
        Ok(self.clone())
    }
}

impl ItemSource for [Item] {
    fn find_all(&self) -> anyhow::Result<Vec<Item>> {
        Ok(self.to_vec())
    }
}
