//! Persisted state between runs: the merged list and the per-feed watermarks.
//!
//! Both live in RSS 2.0 documents written by [`crate::output`]. Loading is
//! tolerant: a missing file is the normal first-run case, and an unreadable
//! or unparsable file is reported and treated as empty.
use std::path::{Path, PathBuf};

use crate::feed::{parse_items, Item};
use crate::merge::Watermarks;
use crate::output::{write_document, WriteError, MERGED_CHANNEL, SEEN_CHANNEL};

/// Publisher assigned to previously merged items lacking `<rm:publisher>`.
const MERGED_PUBLISHER: &str = "seen";
/// Publisher assigned to watermark items lacking `<rm:publisher>`.
const WATERMARK_PUBLISHER: &str = "lastseen";

/// State carried over from the previous run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorState {
    pub merged: Vec<Item>,
    pub watermarks: Watermarks,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    merged_path: PathBuf,
    seen_path: PathBuf,
}

impl StateStore {
    pub fn new(merged_path: impl Into<PathBuf>, seen_path: impl Into<PathBuf>) -> Self {
        Self {
            merged_path: merged_path.into(),
            seen_path: seen_path.into(),
        }
    }

    pub fn merged_path(&self) -> &Path {
        &self.merged_path
    }

    pub fn seen_path(&self) -> &Path {
        &self.seen_path
    }

    /// Loads the previous merged list and watermarks. Never fails.
    pub async fn load(&self) -> PriorState {
        let merged = load_items(&self.merged_path, MERGED_PUBLISHER).await;
        let watermarks = Watermarks::new(load_items(&self.seen_path, WATERMARK_PUBLISHER).await);

        tracing::debug!(
            merged = merged.len(),
            watermarks = watermarks.len(),
            "Loaded previous state"
        );

        PriorState { merged, watermarks }
    }

    pub fn save_merged(&self, items: &[Item]) -> Result<(), WriteError> {
        write_document(&self.merged_path, &MERGED_CHANNEL, items)
    }

    pub fn save_watermarks(&self, items: &[Item]) -> Result<(), WriteError> {
        write_document(&self.seen_path, &SEEN_CHANNEL, items)
    }
}

async fn load_items(path: &Path, default_publisher: &str) -> Vec<Item> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No previous state file, starting empty");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot read state file, starting empty");
            return Vec::new();
        }
    };

    match parse_items(&bytes, default_publisher) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot parse state file, starting empty");
            Vec::new()
        }
    }
}
