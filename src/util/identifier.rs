use thiserror::Error;

/// Errors that can occur during feed identifier validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FeedIdError {
    #[error("Feed identifier is empty")]
    Empty,
    #[error("Feed identifier contains invalid character {0:?} (allowed: A-Z a-z 0-9 _ - .)")]
    InvalidChar(char),
}

/// Validates a feed identifier.
///
/// Identifiers end up as `<rm:publisher>` text and as SQL string values, so
/// only ASCII alphanumerics, `_`, `-` and `.` are accepted.
pub fn validate_feed_id(id: &str) -> Result<(), FeedIdError> {
    if id.is_empty() {
        return Err(FeedIdError::Empty);
    }
    match id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        Some(c) => Err(FeedIdError::InvalidChar(c)),
        None => Ok(()),
    }
}
