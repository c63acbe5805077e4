//! One merge run: fetch and parse each configured feed in order, fold the
//! results through the merge engine, then hand the outcome to the sinks.
//!
//! Feeds are processed one at a time. A fetch or parse failure only affects
//! the feed it happened on; the run always completes.
use std::io::Write;
use thiserror::Error;

use crate::config::{FeedList, FeedSource};
use crate::feed::{parse_items, FetchError, Fetcher, Item, ParseError};
use crate::merge::{merge_feed, MergeOutcome, MergeRun};
use crate::output::{write_statements, WriteError};
use crate::store::{PriorState, StateStore};

/// Why a feed contributed nothing to a run.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Outcome of processing a single feed.
#[derive(Debug)]
pub struct FeedReport {
    pub feed_id: String,
    /// Number of new items found, or the error that made the feed skip this run
    pub result: Result<usize, FeedError>,
}

#[derive(Debug)]
pub struct RunResult {
    pub outcome: MergeOutcome,
    /// One entry per configured feed, in processing order.
    pub reports: Vec<FeedReport>,
}

impl RunResult {
    /// Identifiers of the feeds that failed to fetch or parse this run.
    pub fn failed_feeds(&self) -> impl Iterator<Item = &str> {
        self.reports
            .iter()
            .filter(|report| report.result.is_err())
            .map(|report| report.feed_id.as_str())
    }
}

/// Runs the merge over every feed in `feeds`.
///
/// Feeds that fail to fetch or parse are logged and skipped; their previous
/// watermark is carried into the outcome.
pub async fn run(
    fetcher: &Fetcher,
    feeds: &FeedList,
    prior: PriorState,
    items_max: usize,
) -> RunResult {
    let mut merge_run = MergeRun::new(items_max);
    let mut reports = Vec::with_capacity(feeds.len());

    for feed in feeds.iter() {
        tracing::info!(feed = %feed.id, url = %feed.url, "Processing feed");

        let result = match fetch_items(fetcher, feed).await {
            Ok(published) => {
                if let Some(watermark) = prior.watermarks.find(&feed.id) {
                    tracing::debug!(feed = %feed.id, last_seen = %watermark.title, "Found watermark");
                }
                let step = merge_feed(&feed.id, published, &prior.watermarks);
                let new = step.new_items.len();
                merge_run.absorb(step);
                tracing::info!(feed = %feed.id, new = new, "Merged feed");
                Ok(new)
            }
            Err(e) => {
                match &e {
                    FeedError::Fetch(_) => {
                        tracing::warn!(feed = %feed.id, url = %feed.url, error = %e, "Failed to retrieve RSS feed")
                    }
                    FeedError::Parse(_) => {
                        tracing::warn!(feed = %feed.id, url = %feed.url, error = %e, "Cannot parse RSS feed")
                    }
                }
                Err(e)
            }
        };

        reports.push(FeedReport {
            feed_id: feed.id.clone(),
            result,
        });
    }

    let outcome = merge_run.finish(prior.merged, &prior.watermarks, feeds.ids());
    tracing::info!(
        merged = outcome.merged.len(),
        new = outcome.new_items.len(),
        watermarks = outcome.new_watermarks.len(),
        "Merge complete"
    );

    RunResult { outcome, reports }
}

async fn fetch_items(fetcher: &Fetcher, feed: &FeedSource) -> Result<Vec<Item>, FeedError> {
    let bytes = fetcher.fetch(&feed.url).await?;
    tracing::debug!(feed = %feed.id, bytes = bytes.len(), "Retrieved feed");

    let items = parse_items(&bytes, &feed.id)?;
    tracing::debug!(feed = %feed.id, items = items.len(), "Found published items");
    Ok(items)
}

/// How the outcome of a run is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Rewrite the merged and watermark documents.
    Feed,
    /// Print new items as insert statements to `out` and rewrite only the
    /// watermark document.
    Queries,
}

/// Delivers `outcome` according to `mode`.
///
/// Every output is attempted even when an earlier one fails. Failures are
/// logged and returned.
pub fn deliver<W: Write>(
    store: &StateStore,
    outcome: &MergeOutcome,
    mode: OutputMode,
    out: &mut W,
) -> Vec<WriteError> {
    let mut failures = Vec::new();

    match mode {
        OutputMode::Queries => {
            if let Err(source) = write_statements(out, &outcome.new_items) {
                failures.push(WriteError::Io {
                    path: "<stdout>".to_string(),
                    source,
                });
            }
        }
        OutputMode::Feed => {
            if let Err(e) = store.save_merged(&outcome.merged) {
                failures.push(e);
            }
        }
    }

    if let Err(e) = store.save_watermarks(&outcome.new_watermarks) {
        failures.push(e);
    }

    for e in &failures {
        tracing::error!(error = %e, "Failed to write output");
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> Item {
        Item {
            title: title.to_string(),
            link: "https://example.com/".to_string(),
            description: "Body".to_string(),
            publisher: "a".to_string(),
            date: "Tue, 10 Jun 2003 04:00:00 +0000".to_string(),
        }
    }

    fn outcome() -> MergeOutcome {
        MergeOutcome {
            merged: vec![item("new"), item("old")],
            new_items: vec![item("new")],
            new_watermarks: vec![item("new")],
        }
    }

    fn temp_store(name: &str) -> (std::path::PathBuf, StateStore) {
        let dir = std::env::temp_dir().join(format!("rssmerger_run_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let store = StateStore::new(dir.join("merged.rss"), dir.join("seen.rss"));
        (dir, store)
    }

    #[test]
    fn test_feed_mode_writes_both_documents() {
        let (dir, store) = temp_store("feed_mode");
        let mut out = Vec::new();

        let failures = deliver(&store, &outcome(), OutputMode::Feed, &mut out);
        assert!(failures.is_empty());
        assert!(out.is_empty());
        assert!(store.merged_path().exists());
        assert!(store.seen_path().exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_queries_mode_skips_merged_document() {
        let (dir, store) = temp_store("queries_mode");
        let mut out = Vec::new();

        let failures = deliver(&store, &outcome(), OutputMode::Queries, &mut out);
        assert!(failures.is_empty());
        assert!(String::from_utf8(out).unwrap().starts_with("INSERT INTO rssitems"));
        assert!(!store.merged_path().exists());
        assert!(store.seen_path().exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_feeds_lists_skipped_ids() {
        let result = RunResult {
            outcome: outcome(),
            reports: vec![
                FeedReport {
                    feed_id: "ok".to_string(),
                    result: Ok(1),
                },
                FeedReport {
                    feed_id: "broken".to_string(),
                    result: Err(FeedError::Parse(ParseError::NoRootElement)),
                },
                FeedReport {
                    feed_id: "empty".to_string(),
                    result: Ok(0),
                },
            ],
        };
        assert_eq!(result.failed_feeds().collect::<Vec<_>>(), vec!["broken"]);
    }

    #[test]
    fn test_failed_write_does_not_stop_second() {
        let (dir, _) = temp_store("partial_write");
        let store = StateStore::new(dir.join("missing_dir").join("merged.rss"), dir.join("seen.rss"));
        let mut out = Vec::new();

        let failures = deliver(&store, &outcome(), OutputMode::Feed, &mut out);
        assert_eq!(failures.len(), 1);
        assert!(store.seen_path().exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
