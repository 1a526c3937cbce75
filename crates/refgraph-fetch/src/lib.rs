//! Default document fetcher for refgraph.
//!
//! Reads local paths from disk and remote URLs over HTTP(S), with
//! timeouts and a plaintext guard. Each failure is reported as a
//! [`FetchOutcome`] so one bad reference never aborts a resolution.

pub mod error;
pub mod source;

pub use error::FetchError;
pub use source::{FetcherConfig, SourceFetcher, ORIGIN_HEADER};
