// src/collections/url_set.rs

//! URL set with a movable pivot boundary.
//!
//! The pivot splits the set into a "discovered this run" region before it and
//! a stable region from the pivot onward. While no pivot is set new URLs
//! append at the tail; once a pivot is anchored they are inserted immediately
//! before it, so the newest entries accumulate at the head. Trimming pops
//! from the tail, discarding the stable region first.

use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::collections::OrderedSet;
use crate::error::{Result, StateError};

/// Default per-key history bound.
pub const DEFAULT_TRIM_LEN: usize = 1000;

/// An ordered set of URLs partitioned by an optional pivot element.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UrlOrderedSet {
    urls: OrderedSet<String>,
    pivot: Option<String>,
}

impl UrlOrderedSet {
    /// Create an empty set with no pivot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs in the set.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether the set holds no URLs.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Whether `url` is a member.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(&url.to_string())
    }

    /// The current pivot, if one is anchored.
    pub fn pivot(&self) -> Option<&str> {
        self.pivot.as_deref()
    }

    /// The head URL, if any.
    pub fn first(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    /// The tail URL, if any.
    pub fn last(&self) -> Option<&str> {
        self.urls.last().map(String::as_str)
    }

    /// Positional access; negative positions count from the tail.
    pub fn get(&self, position: isize) -> Option<&str> {
        self.urls.get(position).map(String::as_str)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Record a URL relative to the pivot boundary.
    ///
    /// Appends at the tail while no pivot is set; otherwise inserts
    /// immediately before the pivot. No-op if the URL is already present.
    pub fn add_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        match &self.pivot {
            Some(pivot) => {
                // Every removal path clears a removed pivot, so the target
                // is always a member here.
                let pivot = pivot.clone();
                let _ = self.urls.add_before(&pivot, url);
            }
            None => {
                self.urls.add(url);
            }
        }
    }

    /// Append a URL at the tail regardless of the pivot.
    pub fn add(&mut self, url: impl Into<String>) -> bool {
        self.urls.add(url.into())
    }

    /// Remove a URL if present. A removed pivot is cleared.
    pub fn discard(&mut self, url: &str) -> bool {
        let removed = self.urls.discard(&url.to_string());
        if removed {
            self.clear_pivot_if(url);
        }
        removed
    }

    /// Remove and return the head URL.
    pub fn pop_first(&mut self) -> Option<String> {
        let popped = self.urls.pop_first();
        if let Some(url) = &popped {
            self.clear_pivot_if(url);
        }
        popped
    }

    /// Remove and return the tail URL.
    pub fn pop_last(&mut self) -> Option<String> {
        let popped = self.urls.pop_last();
        if let Some(url) = &popped {
            self.clear_pivot_if(url);
        }
        popped
    }

    /// Anchor the pivot.
    ///
    /// With `None` the pivot becomes the current head; the set must not be
    /// empty. An explicit URL must already be a member.
    pub fn set_pivot(&mut self, url: Option<String>) -> Result<()> {
        match url {
            None => {
                let head = self
                    .urls
                    .first()
                    .cloned()
                    .ok_or_else(|| StateError::empty_set("set_pivot"))?;
                self.pivot = Some(head);
            }
            Some(url) => {
                if !self.urls.contains(&url) {
                    return Err(StateError::missing(&url));
                }
                self.pivot = Some(url);
            }
        }
        Ok(())
    }

    /// Drop tail URLs until the set holds at most `max_len` entries.
    pub fn trim(&mut self, max_len: usize) {
        while self.urls.len() > max_len {
            if let Some(removed) = self.urls.pop_last() {
                self.clear_pivot_if(&removed);
            }
        }
    }

    fn clear_pivot_if(&mut self, removed: &str) {
        if self.pivot.as_deref() == Some(removed) {
            self.pivot = None;
        }
    }
}

impl FromIterator<String> for UrlOrderedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
            pivot: None,
        }
    }
}

impl fmt::Debug for UrlOrderedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlOrderedSet")
            .field("pivot", &self.pivot)
            .field("urls", &self.urls)
            .finish()
    }
}

impl Serialize for UrlOrderedSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UrlOrderedSet", 2)?;
        state.serialize_field("pivot", &self.pivot)?;
        state.serialize_field("urls", &self.urls)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for UrlOrderedSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Repr {
            #[serde(default)]
            pivot: Option<String>,
            #[serde(default)]
            urls: OrderedSet<String>,
        }

        let repr = Repr::deserialize(deserializer)?;
        if let Some(pivot) = &repr.pivot {
            if !repr.urls.contains(pivot) {
                return Err(D::Error::custom(format!(
                    "pivot {pivot:?} is not a member of the set"
                )));
            }
        }
        Ok(Self {
            urls: repr.urls,
            pivot: repr.pivot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls_of(set: &UrlOrderedSet) -> Vec<&str> {
        set.iter().collect()
    }

    #[test]
    fn add_url_appends_without_pivot() {
        let mut set = UrlOrderedSet::new();
        set.add_url("https://a.example/1");
        set.add_url("https://a.example/2");
        set.add_url("https://a.example/1");
        assert_eq!(urls_of(&set), vec!["https://a.example/1", "https://a.example/2"]);
    }

    #[test]
    fn add_url_lands_before_pivot() {
        let mut set = UrlOrderedSet::new();
        set.add_url("u1");
        set.add_url("u2");
        set.set_pivot(None).unwrap();
        assert_eq!(set.pivot(), Some("u1"));

        set.add_url("v1");
        set.add_url("v2");
        assert_eq!(urls_of(&set), vec!["v1", "v2", "u1", "u2"]);

        // Every new URL stays strictly before the pivot.
        let pivot_pos = set.iter().position(|u| u == "u1").unwrap();
        let v2_pos = set.iter().position(|u| u == "v2").unwrap();
        assert!(v2_pos < pivot_pos);
    }

    #[test]
    fn set_pivot_on_empty_set_fails() {
        let mut set = UrlOrderedSet::new();
        let err = set.set_pivot(None).unwrap_err();
        assert!(matches!(err, StateError::EmptySet { .. }));
    }

    #[test]
    fn set_pivot_requires_membership() {
        let mut set = UrlOrderedSet::new();
        set.add_url("u1");
        let err = set.set_pivot(Some("stranger".to_string())).unwrap_err();
        assert!(matches!(err, StateError::MissingElement { .. }));

        set.set_pivot(Some("u1".to_string())).unwrap();
        assert_eq!(set.pivot(), Some("u1"));
    }

    #[test]
    fn trim_drops_tail_and_is_idempotent() {
        let mut set = UrlOrderedSet::new();
        for i in 0..10 {
            set.add_url(format!("u{i}"));
        }
        set.trim(4);
        assert_eq!(urls_of(&set), vec!["u0", "u1", "u2", "u3"]);
        set.trim(4);
        assert_eq!(urls_of(&set), vec!["u0", "u1", "u2", "u3"]);
        set.trim(100);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn trim_keeps_region_before_pivot() {
        let mut set = UrlOrderedSet::new();
        for i in 0..3 {
            set.add_url(format!("old{i}"));
        }
        set.set_pivot(None).unwrap();
        for i in 0..3 {
            set.add_url(format!("new{i}"));
        }

        // [new0 new1 new2 old0 old1 old2] -> tail pops take the old entries.
        set.trim(4);
        assert_eq!(urls_of(&set), vec!["new0", "new1", "new2", "old0"]);
        assert_eq!(set.pivot(), Some("old0"));
    }

    #[test]
    fn removing_the_pivot_clears_it() {
        let mut set = UrlOrderedSet::new();
        set.add_url("u1");
        set.add_url("u2");
        set.set_pivot(None).unwrap();

        set.discard("u1");
        assert_eq!(set.pivot(), None);

        // With no pivot the set appends again.
        set.add_url("u3");
        assert_eq!(urls_of(&set), vec!["u2", "u3"]);
    }

    #[test]
    fn trim_past_pivot_clears_it() {
        let mut set = UrlOrderedSet::new();
        for i in 0..5 {
            set.add_url(format!("u{i}"));
        }
        set.set_pivot(Some("u4".to_string())).unwrap();
        set.trim(2);
        assert_eq!(set.pivot(), None);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_round_trip_preserves_order_and_pivot() {
        let mut set = UrlOrderedSet::new();
        set.add_url("u1");
        set.add_url("u2");
        set.set_pivot(None).unwrap();
        set.add_url("v1");

        let json = serde_json::to_string(&set).unwrap();
        let back: UrlOrderedSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
        assert_eq!(back.pivot(), Some("u1"));
        assert_eq!(urls_of(&back), vec!["v1", "u1", "u2"]);
    }

    #[test]
    fn deserialize_rejects_dangling_pivot() {
        let json = r#"{"pivot":"gone","urls":["u1","u2"]}"#;
        let result: std::result::Result<UrlOrderedSet, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
