//! Merges several RSS/RDF feeds into a single RSS 2.0 feed while retaining
//! the order in which items appeared.
//!
//! Each run fetches every configured feed, keeps only the items published
//! since the feed's watermark (the newest item seen last run), puts them in
//! front of the previously merged items, and persists the merged list and
//! the new watermarks as two RSS documents.

pub mod config;
pub mod feed;
pub mod merge;
pub mod output;
pub mod run;
pub mod store;
pub mod util;
