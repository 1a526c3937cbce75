use thiserror::Error;

/// Errors raised while fetching one document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    BuildError(#[source] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("plaintext HTTP not allowed: {0}")]
    PlaintextNotAllowed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to read response body: {0}")]
    ResponseReadError(#[source] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
