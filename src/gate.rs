// src/gate.rs

//! Request-filtering gate over the crawl state.
//!
//! The crawl driver calls one hook per host-framework event: a proposed
//! request, a fetched response, a produced record, and job end. The host
//! delivers these events serialized per job, so the hooks take plain
//! `&self`/`&mut self`; a host dispatching callbacks from several threads
//! wraps the gate in a `Mutex`.
//!
//! Skip decisions are values, not errors. The crawl simply moves on to the
//! next candidate URL.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{Config, Record, RecordKind};
use crate::state::snapshot::default_run_id;
use crate::state::{BlockReason, CrawlState, SaveSummary, SnapshotStore};

/// Listing/detail split driving response classification.
///
/// A broken listing page is abandoned for good; a broken detail page may be
/// temporary (e.g. moved to an archive) and is only expired under its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A top-level board/forum listing page
    Listing,
    /// A leaf page: topic, comment, article
    Detail,
}

/// Outcome of a request or response hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request/response proceed
    Allow,
    /// Skip it, for the given reason
    Skip(BlockReason),
}

impl Decision {
    /// Whether the request/response may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Derives the grouping key of a URL, if it has one.
pub type KeyFn = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Classifies a URL as listing or detail.
pub type ClassifyFn = Box<dyn Fn(&str) -> UrlKind + Send + Sync>;

/// Caller-supplied policy for a [`RequestGate`].
pub struct GatePolicy {
    key_fn: KeyFn,
    classify: ClassifyFn,
    mark_as_scraped: BTreeSet<RecordKind>,
    max_urls_per_key: usize,
    run_id: Option<String>,
}

impl GatePolicy {
    /// Create a policy from the two injected URL functions.
    ///
    /// No record kind marks URLs as scraped until one is configured.
    pub fn new(key_fn: KeyFn, classify: ClassifyFn) -> Self {
        Self {
            key_fn,
            classify,
            mark_as_scraped: BTreeSet::new(),
            max_urls_per_key: crate::collections::DEFAULT_TRIM_LEN,
            run_id: None,
        }
    }

    /// Create a policy with settings taken from the configuration.
    pub fn from_config(config: &Config, key_fn: KeyFn, classify: ClassifyFn) -> Self {
        Self::new(key_fn, classify)
            .with_marked_kinds(config.state.mark_as_scraped.iter().copied())
            .with_trim_bound(config.state.max_urls_per_key)
            .with_run_id(config.state.run_id())
    }

    /// Record kinds whose production marks the source URL as scraped.
    pub fn with_marked_kinds(mut self, kinds: impl IntoIterator<Item = RecordKind>) -> Self {
        self.mark_as_scraped = kinds.into_iter().collect();
        self
    }

    /// Per-key history bound applied at job end.
    pub fn with_trim_bound(mut self, max_urls_per_key: usize) -> Self {
        self.max_urls_per_key = max_urls_per_key;
        self
    }

    /// Fixed run id for the final snapshot (defaults to a timestamp).
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Per-job request gate.
///
/// Opened once at job start, consulted on every request and response, and
/// consumed by [`finish`] at job end — finalization cannot run twice.
///
/// [`finish`]: RequestGate::finish
pub struct RequestGate {
    snapshots: Box<dyn SnapshotStore>,
    state: CrawlState,
    policy: GatePolicy,
}

impl RequestGate {
    /// Open the gate, loading the previous run's state via the run pointer.
    pub async fn open(snapshots: Box<dyn SnapshotStore>, policy: GatePolicy) -> Self {
        let state = CrawlState::load(snapshots.as_ref()).await;
        Self {
            snapshots,
            state,
            policy,
        }
    }

    /// The current crawl state, for inspection.
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Gate a proposed request before it reaches the network layer.
    pub fn on_request(&self, url: &str) -> Decision {
        let key = (self.policy.key_fn)(url);
        match self.state.is_blocked(url, key.as_deref()) {
            Some(reason) => {
                log::debug!("Request ignored: {reason}: {url}");
                Decision::Skip(reason)
            }
            None => Decision::Allow,
        }
    }

    /// Classify a fetched response by status code.
    ///
    /// Error statuses blacklist listing URLs and expire detail URLs under
    /// their grouping key; everything else passes through unchanged.
    pub fn on_response(&mut self, url: &str, status: u16) -> Decision {
        if status < 400 {
            return Decision::Allow;
        }
        match (self.policy.classify)(url) {
            UrlKind::Listing => {
                self.state.record_blacklist(url);
                log::warn!("Response ignored: status {status} ({url}), added to blacklist");
                Decision::Skip(BlockReason::Blacklisted)
            }
            UrlKind::Detail => match (self.policy.key_fn)(url) {
                Some(key) => {
                    self.state.record_failure(&key, url);
                    log::warn!(
                        "Response ignored: status {status} ({url}), added to expired urls"
                    );
                    Decision::Skip(BlockReason::Expired)
                }
                None => {
                    log::debug!("No grouping key for {url}, response passed through");
                    Decision::Allow
                }
            },
        }
    }

    /// Note a produced record, marking its source URL as scraped when the
    /// record's kind is configured to do so.
    pub fn on_record(&mut self, record: &Record) {
        if !self.policy.mark_as_scraped.contains(&record.kind) {
            return;
        }
        if let Some(key) = (self.policy.key_fn)(&record.url) {
            self.state.record_success(&key, record.url.as_str());
        }
    }

    /// Job-finished hook: trim and pivot every history, snapshot the state
    /// and advance the run pointer.
    ///
    /// Consumes the gate so finalization runs exactly once per job.
    pub async fn finish(mut self) -> Result<SaveSummary> {
        self.state.finalize(self.policy.max_urls_per_key)?;
        let run_id = self.policy.run_id.take().unwrap_or_else(default_run_id);
        self.state.save(self.snapshots.as_ref(), &run_id).await
    }
}
