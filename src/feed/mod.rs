//! Feed retrieval and item extraction.
//!
//! - [`item`] - The [`Item`] record and its sentinel defaults
//! - [`dom`] - Typed XML tree built on `quick-xml`
//! - [`parser`] - Extraction of `<item>` elements from RSS/RDF documents
//! - [`fetcher`] - HTTP(S) and `file://` retrieval with a fixed timeout
//!
//! # Example
//!
//! ```ignore
//! use rssmerger::feed::{parse_items, Fetcher};
//!
//! let fetcher = Fetcher::new()?;
//! let bytes = fetcher.fetch("https://example.com/rss").await?;
//! let items = parse_items(&bytes, "example")?;
//! ```

mod dom;
mod fetcher;
mod item;
mod parser;

pub use dom::{parse_document, Document, Element, Node, ParseError};
pub use fetcher::{FetchError, Fetcher, FETCH_TIMEOUT};
pub use item::{
    current_date, Item, DEFAULT_DESCRIPTION, DEFAULT_LINK, DEFAULT_TITLE, MARKUP_PLACEHOLDER,
};
pub use parser::{extract_items, parse_items};
