// src/collections/mod.rs

//! Ordered containers backing the crawl-state store.

pub mod ordered_set;
pub mod url_set;

// Re-export for convenience
pub use ordered_set::OrderedSet;
pub use url_set::{DEFAULT_TRIM_LEN, UrlOrderedSet};
