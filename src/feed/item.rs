use chrono::Utc;

/// Title used when an `<item>` has no usable `<title>`.
pub const DEFAULT_TITLE: &str = "No title";
/// Link used when an `<item>` has no usable `<link>`.
pub const DEFAULT_LINK: &str = "http://localhost/";
/// Description used when an `<item>` has neither `<description>` nor `<content:encoded>`.
pub const DEFAULT_DESCRIPTION: &str = "No description";
/// Placeholder for a field whose first child is markup instead of text.
pub const MARKUP_PLACEHOLDER: &str = "??";

/// RFC-822 layout used for item dates, always in UTC.
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

/// One feed entry.
///
/// Every field is always populated. Fields missing from the source document
/// carry the sentinel defaults above, `publisher` falls back to the feed
/// identifier and `date` to the time of extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Identifier of the feed this item came from.
    pub publisher: String,
    /// RFC-822 style timestamp.
    pub date: String,
}

impl Item {
    /// Creates an item with every field set to its default for `publisher`.
    pub fn with_defaults(publisher: &str) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            link: DEFAULT_LINK.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            publisher: publisher.to_string(),
            date: current_date(),
        }
    }
}

/// Current UTC time formatted like an RSS `pubDate`.
pub fn current_date() -> String {
    Utc::now().format(DATE_FORMAT).to_string()
}
