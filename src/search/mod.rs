//! Search Module
//!
//! The service composing store, prefix index and result cache.

mod service;

pub use service::{normalize, SearchCache, SearchResults, SearchService};
