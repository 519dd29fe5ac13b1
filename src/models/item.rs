//! Catalog item model
//!
//! Items are immutable records shared by reference between the store, the
//! prefix index and cached search results.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Shared handle to an immutable item.
pub type ItemRef = Arc<Item>;

// == Category ==
/// Opaque category tag. Nothing in the core branches on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Book,
    EBook,
    AudioBook,
    Video,
    Magazine,
    Other(String),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Book => write!(f, "book"),
            Category::EBook => write!(f, "e-book"),
            Category::AudioBook => write!(f, "audio book"),
            Category::Video => write!(f, "video"),
            Category::Magazine => write!(f, "magazine"),
            Category::Other(tag) => write!(f, "{}", tag),
        }
    }
}

// == Item ==
/// A catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: String,
    title: String,
    #[serde(default)]
    creator: String,
    price: f64,
    year: i32,
    category: Category,
}

impl Item {
    // == Constructor ==
    /// Creates a validated item with no creator.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: f64,
        year: i32,
        category: Category,
    ) -> Result<Self> {
        let item = Self {
            id: id.into(),
            title: title.into(),
            creator: String::new(),
            price,
            year,
            category,
        };
        item.validate()?;
        Ok(item)
    }

    /// Returns a copy of this item with the given creator.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    // == Validate ==
    /// Re-checks structural invariants.
    ///
    /// Items built through [`Item::new`] always pass; deserialized items may not.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::InvalidArgument(
                "item id must not be empty".to_string(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(CatalogError::InvalidArgument(format!(
                "item {} has an empty title",
                self.id
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CatalogError::InvalidArgument(format!(
                "item {} has invalid price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Lowercase title, the key used by the prefix index.
    pub fn normalized_title(&self) -> String {
        self.title.to_lowercase()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, {}) {:.2}",
            self.id, self.title, self.category, self.year, self.price
        )
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_new_valid() {
        let item = Item::new("B1", "Rust in Action", 39.5, 2021, Category::Book)
            .unwrap()
            .with_creator("Tim McNamara");

        assert_eq!(item.id(), "B1");
        assert_eq!(item.title(), "Rust in Action");
        assert_eq!(item.creator(), "Tim McNamara");
        assert_eq!(item.price(), 39.5);
        assert_eq!(item.year(), 2021);
        assert_eq!(item.category(), &Category::Book);
        assert_eq!(item.normalized_title(), "rust in action");
    }

    #[test]
    fn test_item_rejects_empty_id_and_title() {
        assert!(matches!(
            Item::new("", "Title", 1.0, 2000, Category::Book),
            Err(CatalogError::InvalidArgument(_))
        ));
        assert!(matches!(
            Item::new("X", "   ", 1.0, 2000, Category::Book),
            Err(CatalogError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_item_rejects_bad_price() {
        assert!(Item::new("X", "T", -0.01, 2000, Category::Video).is_err());
        assert!(Item::new("X", "T", f64::NAN, 2000, Category::Video).is_err());
        assert!(Item::new("X", "T", 0.0, 2000, Category::Video).is_ok());
    }

    #[test]
    fn test_deserialized_item_is_revalidated() {
        let item: Item = serde_json::from_str(
            r#"{"id":"M1","title":"Wired","price":-3.0,"year":2020,"category":"magazine"}"#,
        )
        .unwrap();
        assert!(item.validate().is_err());
        assert_eq!(item.creator(), "");
    }

    #[test]
    fn test_display() {
        let item = Item::new("V1", "Alien", 9.99, 1979, Category::Video).unwrap();
        assert_eq!(item.to_string(), "[V1] Alien (video, 1979) 9.99");
    }
}
