//! Output sinks: RSS 2.0 documents and SQL insert statements.

mod queries;
mod rss;

use thiserror::Error;

pub use queries::{escape_quotes, insert_statement, write_statements};
pub use rss::{
    render_document, write_document, Channel, MERGED_CHANNEL, PUBLISHER_NAMESPACE, SEEN_CHANNEL,
};

/// Errors that can occur while persisting an output document.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The XML writer failed.
    #[error("Failed to serialize RSS: {0}")]
    Serialize(String),

    /// The file could not be created, written or renamed into place.
    #[error("Couldn't write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
