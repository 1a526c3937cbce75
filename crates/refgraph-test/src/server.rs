//! FixtureServer: serves spec documents over HTTP for resolution tests.

use std::path::PathBuf;

use tempfile::TempDir;
use thiserror::Error;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Errors from FixtureServer operations.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mock server did not record requests")]
    RecordingDisabled,
}

/// A mock document host plus a scratch directory for root specs.
///
/// Documents are mounted under absolute paths (`/models/pet.yaml`) and
/// addressed by [`FixtureServer::url`]. Root specs that point at the server
/// are written to the scratch directory so the CLI can read them from disk.
pub struct FixtureServer {
    server: MockServer,
    /// Scratch directory (kept alive for the test duration).
    dir: TempDir,
}

impl FixtureServer {
    /// Start a server on a random local port.
    pub async fn start() -> Result<Self, TestError> {
        Ok(Self {
            server: MockServer::start().await,
            dir: TempDir::new()?,
        })
    }

    /// Serve `body` at `doc_path` with status 200.
    pub async fn serve(&self, doc_path: &str, body: impl Into<String>) {
        Mock::given(method("GET"))
            .and(path(doc_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/yaml")
                    .set_body_string(body.into()),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer `doc_path` with a bare status code.
    pub async fn serve_status(&self, doc_path: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(doc_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Absolute URL of a served document.
    pub fn url(&self, doc_path: &str) -> String {
        format!("{}{}", self.server.uri(), doc_path)
    }

    /// Write a root spec into the scratch directory.
    pub fn write_root(&self, name: &str, content: &str) -> Result<PathBuf, TestError> {
        let file = self.dir.path().join(name);
        std::fs::write(&file, content)?;
        Ok(file)
    }

    /// Number of requests received for `doc_path`.
    pub async fn hits(&self, doc_path: &str) -> Result<usize, TestError> {
        let requests = self
            .server
            .received_requests()
            .await
            .ok_or(TestError::RecordingDisabled)?;
        Ok(requests.iter().filter(|r| r.url.path() == doc_path).count())
    }
}

/// A YAML document whose `components.schemas` entries each reference `refs`.
pub fn schemas_referencing(refs: &[String]) -> String {
    let mut yaml = String::from("components:\n  schemas:\n");
    if refs.is_empty() {
        yaml.push_str("    Leaf:\n      type: string\n");
    }
    for (i, r) in refs.iter().enumerate() {
        yaml.push_str(&format!("    S{i}:\n      $ref: '{r}#/components/schemas/Leaf'\n"));
    }
    yaml
}
