//! Validation of the feed list.
//!
//! - **Feed identifiers**: restricted to characters safe in XML text and SQL values
//! - **Feed URLs**: http, https or file URLs only

mod identifier;
mod url_validator;

pub use identifier::{validate_feed_id, FeedIdError};
pub use url_validator::{validate_feed_url, UrlValidationError};
