//! Catalog data model
//!
//! Defines the immutable item record and the seam through which persisted
//! items are loaded.

pub mod item;
pub mod source;

// Re-export commonly used types
pub use item::{Category, Item, ItemRef};
pub use source::ItemSource;
