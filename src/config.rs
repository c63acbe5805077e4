//! Configuration: the optional `rssmerger.toml` settings file and the
//! `feeds.json` feed list.
//!
//! The settings file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning when the file
//! contains potential typos. The feed list is required.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::merge::DEFAULT_ITEMS_MAX;
use crate::util::{validate_feed_id, validate_feed_url};

/// Maximum size of either configuration file (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid JSON in feed list: {0}")]
    Json(#[from] serde_json::Error),

    /// File exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Settings
// ============================================================================

/// Run settings.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of items kept in the merged document.
    pub items_max: usize,

    /// JSON object mapping feed identifier to URL.
    pub feeds_path: PathBuf,

    /// Merged document, read at start and rewritten at the end.
    pub merged_path: PathBuf,

    /// Watermark document, read at start and rewritten at the end.
    pub seen_path: PathBuf,

    /// Print new items as SQL insert statements instead of writing the merged document.
    pub queries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            items_max: DEFAULT_ITEMS_MAX,
            feeds_path: PathBuf::from("feeds.json"),
            merged_path: PathBuf::from("merged.rss"),
            seen_path: PathBuf::from("seen.rss"),
            queries: false,
        }
    }
}

impl Config {
    /// Load settings from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = read_limited(path)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["items_max", "feeds_path", "merged_path", "seen_path", "queries"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }
}

// ============================================================================
// Feed List
// ============================================================================

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// Identifier, used as the publisher of the feed's items.
    pub id: String,
    pub url: String,
}

/// Configured feeds in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedList {
    feeds: Vec<FeedSource>,
}

impl FeedList {
    pub fn new(feeds: Vec<FeedSource>) -> Self {
        Self { feeds }
    }

    /// Load the feed list from a JSON file. Unlike [`Config::load`], a
    /// missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_limited(path)?.ok_or_else(|| ConfigError::Io {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        })?;
        let feeds = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), feeds = feeds.len(), "Loaded feed list");
        Ok(feeds)
    }

    /// Parse a JSON object of `"identifier": "url"` pairs.
    ///
    /// Key order is preserved. Entries with a non-string value, an unsafe
    /// identifier or an unsupported URL are skipped with a warning.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;

        let mut feeds = Vec::with_capacity(raw.len());
        for (id, value) in raw {
            let Some(url) = value.as_str() else {
                tracing::warn!(feed = %id, "Skipping feed: URL is not a string");
                continue;
            };
            if let Err(e) = validate_feed_id(&id) {
                tracing::warn!(feed = %id, error = %e, "Skipping feed with invalid identifier");
                continue;
            }
            if let Err(e) = validate_feed_url(url) {
                tracing::warn!(feed = %id, url = %url, error = %e, "Skipping invalid feed URL");
                continue;
            }
            feeds.push(FeedSource {
                id,
                url: url.to_string(),
            });
        }

        Ok(Self { feeds })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.feeds.iter()
    }

    /// Feed identifiers in processing order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.feeds.iter().map(|f| f.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

/// Reads a file after checking its size. `Ok(None)` when it does not exist.
fn read_limited(path: &Path) -> Result<Option<String>, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    };

    // Check file size before reading to avoid loading a huge or corrupted file
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_FILE_SIZE => {
            return Err(ConfigError::TooLarge(format!(
                "{} is {} bytes (max {} bytes)",
                path.display(),
                meta.len(),
                MAX_FILE_SIZE
            )));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(e)),
        Ok(_) => {}
    }

    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        // Race condition: file deleted between metadata and read
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(e)),
    }
}

// ============================================================================
// Tests
// ============================================================================
