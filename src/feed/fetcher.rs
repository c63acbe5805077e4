use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Time allowed for one feed, covering both the request and the body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving a feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured URL could not be parsed or uses an unsupported scheme
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Retrieval exceeded the per-feed timeout
    #[error("Request timed out")]
    Timeout,
    /// Reading a `file://` feed failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Retrieves raw feed documents over HTTP(S) or from `file://` URLs.
///
/// Each call is bounded by a single timeout and never retried; a failure is
/// final for the current run.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher with the standard 10-second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rssmerger/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Fetches the document at `url`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] - unparsable URL or scheme other than http/https/file
    /// - [`FetchError::Timeout`] - retrieval took longer than the timeout
    /// - [`FetchError::Network`] - connection or TLS errors
    /// - [`FetchError::HttpStatus`] - non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - body exceeded 10MB
    /// - [`FetchError::Io`] - local file missing or unreadable
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        tokio::time::timeout(self.timeout, self.fetch_url(&parsed))
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn fetch_url(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url).await,
            "file" => read_file(url).await,
            scheme => Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {scheme} (only http/https/file allowed)"
            ))),
        }
    }

    async fn fetch_http(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE).await
    }
}

async fn read_file(url: &Url) -> Result<Vec<u8>, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|_| FetchError::InvalidUrl(format!("not a local file path: {url}")))?;

    let bytes = tokio::fs::read(&path).await.map_err(|source| FetchError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.len() > MAX_FEED_SIZE {
        return Err(FetchError::ResponseTooLarge);
    }
    Ok(bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
