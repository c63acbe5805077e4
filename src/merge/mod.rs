//! Merge engine: decides which published items are new and folds them into
//! the bounded merged list.
//!
//! A run is driven by the caller in two stages:
//!
//! 1. [`merge_feed`] is called once per successfully parsed feed. It only
//!    reads the previous [`Watermarks`] and returns an immutable
//!    [`FeedMerge`] describing that feed's contribution.
//! 2. Each [`FeedMerge`] is absorbed into a [`MergeRun`], which is then
//!    finished with the previously persisted merged list and the configured
//!    feed identifiers to produce a [`MergeOutcome`].
//!
//! New-item detection compares titles only. A feed whose items reuse a title
//! stops the scan at the first repeat, and a feed with no watermark has all of
//! its published items treated as new.

use crate::feed::Item;

/// Default cap on the merged list.
pub const DEFAULT_ITEMS_MAX: usize = 1000;

/// The most recently seen item of each feed, as of the previous run.
///
/// Kept as a flat list because it round-trips through the same RSS document
/// format as the merged output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermarks {
    items: Vec<Item>,
}

impl Watermarks {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Finds the watermark for `feed_id`. If the list holds several entries
    /// for the same publisher the last one wins.
    pub fn find(&self, feed_id: &str) -> Option<&Item> {
        self.items.iter().rev().find(|item| item.publisher == feed_id)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What a single feed contributes to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMerge {
    /// Items newer than the watermark, newest first.
    pub new_items: Vec<Item>,
    /// Newest published item, or `None` when the feed published nothing.
    pub watermark: Option<Item>,
}

/// Classifies the published items of one feed.
///
/// `published` is expected newest first. Items are taken until one has the
/// same title as the feed's watermark; with no watermark every item is new.
/// The newest published item becomes the new watermark whether or not
/// anything new was found.
pub fn merge_feed(feed_id: &str, published: Vec<Item>, watermarks: &Watermarks) -> FeedMerge {
    let Some(newest) = published.first().cloned() else {
        return FeedMerge {
            new_items: Vec::new(),
            watermark: None,
        };
    };

    let last_title = watermarks
        .find(feed_id)
        .map(|item| item.title.as_str())
        .unwrap_or("");

    let new_items: Vec<Item> = published
        .into_iter()
        .take_while(|item| item.title != last_title)
        .collect();

    tracing::debug!(
        feed = %feed_id,
        last_seen = %last_title,
        new = new_items.len(),
        "Classified published items"
    );

    FeedMerge {
        new_items,
        watermark: Some(newest),
    }
}

/// Final result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// New items followed by previously merged items, capped at `items_max`.
    pub merged: Vec<Item>,
    /// Every new item discovered this run, in discovery order. Not capped.
    pub new_items: Vec<Item>,
    /// One watermark per feed that has ever produced items.
    pub new_watermarks: Vec<Item>,
}

/// Accumulates [`FeedMerge`] results for one run.
#[derive(Debug, Clone)]
pub struct MergeRun {
    items_max: usize,
    merged: Vec<Item>,
    new_items: Vec<Item>,
    new_watermarks: Vec<Item>,
}

impl MergeRun {
    pub fn new(items_max: usize) -> Self {
        Self {
            items_max,
            merged: Vec::new(),
            new_items: Vec::new(),
            new_watermarks: Vec::new(),
        }
    }

    /// Appends a feed's new items and records its watermark.
    ///
    /// New items only enter the merged list while it is below the cap, but
    /// are always kept in the uncapped new-item list.
    pub fn absorb(&mut self, step: FeedMerge) {
        for item in step.new_items {
            if self.merged.len() < self.items_max {
                self.merged.push(item.clone());
            }
            self.new_items.push(item);
        }
        if let Some(watermark) = step.watermark {
            self.new_watermarks.push(watermark);
        }
    }

    /// Completes the run.
    ///
    /// `previously_merged` (the merged list persisted by the last run) is
    /// appended behind this run's new items, up to the cap. Then every feed
    /// in `feed_ids` that produced no watermark this run gets its old one
    /// carried forward, so a failed fetch never loses a feed's position.
    pub fn finish<'a>(
        mut self,
        previously_merged: Vec<Item>,
        watermarks: &Watermarks,
        feed_ids: impl IntoIterator<Item = &'a str>,
    ) -> MergeOutcome {
        let room = self.items_max.saturating_sub(self.merged.len());
        self.merged.extend(previously_merged.into_iter().take(room));

        for feed_id in feed_ids {
            if self.new_watermarks.iter().any(|w| w.publisher == feed_id) {
                continue;
            }
            if let Some(old) = watermarks.find(feed_id) {
                tracing::debug!(feed = %feed_id, title = %old.title, "Keeping previous watermark");
                self.new_watermarks.push(old.clone());
            }
        }

        MergeOutcome {
            merged: self.merged,
            new_items: self.new_items,
            new_watermarks: self.new_watermarks,
        }
    }
}
