//! Fetches documents from the local filesystem or over HTTP.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::future::join_all;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use refgraph::pointer::{classify, RefKind};
use refgraph::{FetchOutcome, Fetched, Fetcher};

use crate::error::FetchError;

/// Header carrying the resolution origin tag on outbound requests.
pub const ORIGIN_HEADER: &str = "x-refgraph-origin";

/// Configuration for [`SourceFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Directory relative paths are read from.
    pub base_dir: PathBuf,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Allow plaintext `http://` URLs.
    pub allow_plaintext: bool,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            allow_plaintext: false,
            user_agent: format!("refgraph/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory relative paths resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Set the whole-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Allow or refuse plaintext HTTP.
    pub fn with_allow_plaintext(mut self, allow: bool) -> Self {
        self.allow_plaintext = allow;
        self
    }
}

/// Fetches local files and remote URLs.
#[derive(Clone)]
pub struct SourceFetcher {
    client: Client,
    config: FetcherConfig,
}

impl SourceFetcher {
    /// Create a fetcher with its own connection pool.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::BuildError)?;

        Ok(Self { client, config })
    }

    /// Fetch one path, turning every failure into an outcome.
    pub async fn fetch_one(&self, path: &str, origin: &str) -> FetchOutcome {
        let result = match classify(path) {
            RefKind::Remote => self.fetch_remote(path, origin).await,
            _ => self.fetch_local(Path::new(path)).await,
        };
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path, origin, error = %e, "fetch failed");
                FetchOutcome::Error(e.to_string())
            }
        }
    }

    async fn fetch_remote(&self, raw_url: &str, origin: &str) -> Result<FetchOutcome, FetchError> {
        let url = raw_url
            .parse::<Url>()
            .map_err(|e| FetchError::InvalidUrl(format!("{raw_url}: {e}")))?;

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| FetchError::InvalidUrl(raw_url.to_string()))?;
                return self.fetch_local(&path).await;
            }
            "http" if !self.config.allow_plaintext => {
                return Err(FetchError::PlaintextNotAllowed(raw_url.to_string()));
            }
            "http" | "https" => {}
            other => {
                return Err(FetchError::InvalidUrl(format!(
                    "unsupported scheme '{other}' in {raw_url}"
                )));
            }
        }

        debug!(url = %url, origin, "fetching remote document");
        let response = self
            .client
            .get(url)
            .header(ORIGIN_HEADER, origin)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(raw_url.to_string())
                } else if e.is_connect() {
                    FetchError::ConnectionFailed(e.to_string())
                } else {
                    FetchError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(FetchOutcome::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: raw_url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(FetchError::ResponseReadError)?;
        Ok(FetchOutcome::Content(body))
    }

    async fn fetch_local(&self, path: &Path) -> Result<FetchOutcome, FetchError> {
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.base_dir.join(path)
        };

        debug!(path = %full_path.display(), "reading local document");
        match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => Ok(FetchOutcome::Content(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchOutcome::NotFound),
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}

impl Fetcher for SourceFetcher {
    async fn fetch(&self, paths: &[String], origin: &str) -> Vec<Fetched> {
        join_all(paths.iter().map(|path| async move {
            Fetched::new(path.clone(), self.fetch_one(path, origin).await)
        }))
        .await
    }
}
