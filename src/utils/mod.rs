//! Utility functions and helpers.

pub mod url;

pub use url::{SiteRules, extract_hostname, sld_from_url};
