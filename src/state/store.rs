// src/state/store.rs

//! Per-site crawl state: blacklist plus scraped and expired URL histories.
//!
//! A URL is checked against the blacklist first, then the expired set of its
//! grouping key, then the scraped set. Classification is append-only during
//! a run; at job end every per-key set is trimmed and re-pivoted once, then
//! the whole state is snapshotted behind the run pointer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::collections::UrlOrderedSet;
use crate::error::Result;
use crate::state::snapshot::{
    BLACKLIST_FILE, EXPIRED_FILE, SCRAPED_FILE, SnapshotStore, read_blob, read_pointer,
    write_blob, write_pointer,
};

/// Why a candidate URL must be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The URL is permanently abandoned.
    Blacklisted,
    /// The URL failed before under its grouping key.
    Expired,
    /// A record was already produced from this URL.
    AlreadyScraped,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BlockReason::Blacklisted => "blacklisted",
            BlockReason::Expired => "has expired",
            BlockReason::AlreadyScraped => "already scraped",
        };
        f.write_str(text)
    }
}

/// Metadata about a completed state save.
#[derive(Debug, Clone)]
pub struct SaveSummary {
    /// Run id the pointer now names
    pub run_id: String,
    /// Size of the flat blacklist
    pub blacklist_len: usize,
    /// Grouping keys with scraped history
    pub scraped_keys: usize,
    /// Total scraped URLs across keys
    pub scraped_urls: usize,
    /// Grouping keys with expired history
    pub expired_keys: usize,
    /// Total expired URLs across keys
    pub expired_urls: usize,
}

/// Crawl state for one site across runs.
///
/// BTree containers keep snapshot output deterministic.
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    blacklist: BTreeSet<String>,
    scraped: BTreeMap<String, UrlOrderedSet>,
    expired: BTreeMap<String, UrlOrderedSet>,
}

impl CrawlState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a URL is blocked, and why.
    ///
    /// Order matters: blacklist, then expired, then scraped. The grouping
    /// key is derived by the caller; without one only the blacklist applies.
    pub fn is_blocked(&self, url: &str, key: Option<&str>) -> Option<BlockReason> {
        if self.blacklist.contains(url) {
            return Some(BlockReason::Blacklisted);
        }
        if let Some(key) = key {
            if self.expired.get(key).is_some_and(|set| set.contains(url)) {
                return Some(BlockReason::Expired);
            }
            if self.scraped.get(key).is_some_and(|set| set.contains(url)) {
                return Some(BlockReason::AlreadyScraped);
            }
        }
        None
    }

    /// Permanently abandon a URL.
    pub fn record_blacklist(&mut self, url: impl Into<String>) {
        self.blacklist.insert(url.into());
    }

    /// Record a failed URL under its grouping key.
    pub fn record_failure(&mut self, key: &str, url: impl Into<String>) {
        self.expired.entry(key.to_string()).or_default().add_url(url);
    }

    /// Record a successfully processed URL under its grouping key.
    pub fn record_success(&mut self, key: &str, url: impl Into<String>) {
        self.scraped.entry(key.to_string()).or_default().add_url(url);
    }

    /// The flat blacklist.
    pub fn blacklist(&self) -> &BTreeSet<String> {
        &self.blacklist
    }

    /// Scraped URL history per grouping key.
    pub fn scraped(&self) -> &BTreeMap<String, UrlOrderedSet> {
        &self.scraped
    }

    /// Expired URL history per grouping key.
    pub fn expired(&self) -> &BTreeMap<String, UrlOrderedSet> {
        &self.expired
    }

    /// Trim every per-key history and re-anchor its pivot to the head.
    ///
    /// Runs once per job, after the last mutation and before [`save`].
    /// Sets left empty by a hand-edited snapshot are skipped.
    ///
    /// [`save`]: CrawlState::save
    pub fn finalize(&mut self, max_len: usize) -> Result<()> {
        for set in self.scraped.values_mut().chain(self.expired.values_mut()) {
            if set.is_empty() {
                continue;
            }
            set.trim(max_len);
            set.set_pivot(None)?;
        }
        Ok(())
    }

    /// Load the previous run's state through the run pointer.
    ///
    /// Missing history is not a fault: any read or parse failure along the
    /// way yields an empty state.
    pub async fn load(snapshots: &dyn SnapshotStore) -> Self {
        match Self::try_load(snapshots).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                log::info!("No previous run found, starting with empty crawl state");
                Self::new()
            }
            Err(error) => {
                log::warn!("Ignoring unreadable crawl state ({error}), starting empty");
                Self::new()
            }
        }
    }

    async fn try_load(snapshots: &dyn SnapshotStore) -> Result<Option<Self>> {
        let Some(run_id) = read_pointer(snapshots).await? else {
            return Ok(None);
        };
        log::debug!("Loading crawl state from run {run_id}");

        let blacklist = read_blob(snapshots, &run_id, BLACKLIST_FILE).await?;
        let scraped = read_blob(snapshots, &run_id, SCRAPED_FILE).await?;
        let expired = read_blob(snapshots, &run_id, EXPIRED_FILE).await?;

        Ok(Some(Self {
            blacklist,
            scraped,
            expired,
        }))
    }

    /// Snapshot the state under `run_id` and advance the run pointer.
    ///
    /// The pointer is written only after all three blobs landed, so a failed
    /// save leaves the previous run in effect.
    pub async fn save(
        &self,
        snapshots: &dyn SnapshotStore,
        run_id: &str,
    ) -> Result<SaveSummary> {
        write_blob(snapshots, run_id, BLACKLIST_FILE, &self.blacklist).await?;
        write_blob(snapshots, run_id, SCRAPED_FILE, &self.scraped).await?;
        write_blob(snapshots, run_id, EXPIRED_FILE, &self.expired).await?;

        write_pointer(snapshots, run_id).await?;

        let summary = SaveSummary {
            run_id: run_id.to_string(),
            blacklist_len: self.blacklist.len(),
            scraped_keys: self.scraped.len(),
            scraped_urls: self.scraped.values().map(UrlOrderedSet::len).sum(),
            expired_keys: self.expired.len(),
            expired_urls: self.expired.values().map(UrlOrderedSet::len).sum(),
        };
        log::info!(
            "Crawl state saved to run {}: {} blacklisted, {} scraped, {} expired",
            summary.run_id,
            summary.blacklist_len,
            summary.scraped_urls,
            summary.expired_urls
        );
        Ok(summary)
    }
}
