// src/state/snapshot.rs

//! Durable snapshot storage and the run pointer.
//!
//! Each crawled site owns one state directory. Every finished run writes its
//! three collections into a fresh run directory, then advances the pointer
//! file as the very last step, so a crash mid-save never points at a
//! half-written run.
//!
//! ## Directory Structure
//!
//! ```text
//! <site>/
//! ├── LATEST/
//! │   └── latest.txt            # run pointer: one line naming the newest run
//! └── <run-id>/
//!     ├── blacklist.json
//!     ├── scraped_urls.json
//!     └── expired_urls.json
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, StateError};

/// Run pointer file, relative to the site root.
pub const POINTER_KEY: &str = "LATEST/latest.txt";

/// Blob holding the flat blacklist.
pub const BLACKLIST_FILE: &str = "blacklist.json";

/// Blob holding the per-key scraped URL sets.
pub const SCRAPED_FILE: &str = "scraped_urls.json";

/// Blob holding the per-key expired URL sets.
pub const EXPIRED_FILE: &str = "expired_urls.json";

/// Trait for snapshot storage backends.
///
/// Keys are slash-separated paths relative to the per-site root. Writes must
/// be atomic per key.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read a blob, returning `None` when the key does not exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a blob, creating parent directories as needed.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Local filesystem snapshot backend rooted at a per-site directory.
#[derive(Debug, Clone)]
pub struct LocalSnapshots {
    root_dir: PathBuf,
}

impl LocalSnapshots {
    /// Create a backend rooted at the given site directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshots {
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateError::Io(e)),
        }
    }

    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        // Write to temp, then rename.
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// Generate a timestamped run id, e.g. `2026_0806_143015`.
pub fn default_run_id() -> String {
    Local::now().format("%Y_%m%d_%H%M%S").to_string()
}

/// Read the run pointer. `None` when no run has completed yet.
pub async fn read_pointer(store: &dyn SnapshotStore) -> Result<Option<String>> {
    let Some(bytes) = store.read_bytes(POINTER_KEY).await? else {
        return Ok(None);
    };
    let text =
        String::from_utf8(bytes).map_err(|e| StateError::snapshot(POINTER_KEY, e))?;
    let run_id = text.lines().next().unwrap_or("").trim();
    if run_id.is_empty() {
        Ok(None)
    } else {
        Ok(Some(run_id.to_string()))
    }
}

/// Advance the run pointer to `run_id`.
pub async fn write_pointer(store: &dyn SnapshotStore, run_id: &str) -> Result<()> {
    store.write_bytes(POINTER_KEY, run_id.as_bytes()).await
}

/// Read one snapshot blob of a run, defaulting when the file is absent.
pub async fn read_blob<T>(store: &dyn SnapshotStore, run_id: &str, name: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.read_bytes(&format!("{run_id}/{name}")).await? {
        Some(bytes) => {
            serde_json::from_slice(&bytes).map_err(|e| StateError::snapshot(name, e))
        }
        None => Ok(T::default()),
    }
}

/// Write one snapshot blob of a run.
pub async fn write_blob<T: Serialize + ?Sized>(
    store: &dyn SnapshotStore,
    run_id: &str,
    name: &str,
    value: &T,
) -> Result<()> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| StateError::snapshot(name, e))?;
    store
        .write_bytes(&format!("{run_id}/{name}"), &bytes)
        .await
        .map_err(|e| StateError::snapshot(name, e))
}
