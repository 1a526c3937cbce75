//! Contract between the resolver and whatever reads documents.
//!
//! A [`Fetcher`] receives a batch of unique paths and answers one
//! [`Fetched`] entry per path. Failures are data, not errors: an unreadable
//! target comes back as [`FetchOutcome::NotFound`] or [`FetchOutcome::Error`]
//! and ends up in the missing list.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

use tracing::warn;

/// Reserved prefix that string-based fetchers use to signal a missing target.
pub const NOT_FOUND_MARKER: &str = "__REFGRAPH_NOT_FOUND__";

/// Result of fetching one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Raw document text.
    Content(String),
    /// The target does not exist.
    NotFound,
    /// The target could not be read.
    Error(String),
}

impl FetchOutcome {
    /// Map the string protocol onto the tagged form: absent content and
    /// content starting with [`NOT_FOUND_MARKER`] are `NotFound`.
    pub fn from_raw(raw: Option<String>) -> Self {
        match raw {
            Some(content) if !content.starts_with(NOT_FOUND_MARKER) => Self::Content(content),
            _ => Self::NotFound,
        }
    }

    /// The fetched text, if any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Content(content) => Some(content),
            _ => None,
        }
    }

    /// The path could not be resolved.
    pub fn is_missing(&self) -> bool {
        !matches!(self, Self::Content(_))
    }
}

/// One answered path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// The requested path; identity of the entry.
    pub file_name: String,
    pub outcome: FetchOutcome,
}

impl Fetched {
    pub fn new(file_name: impl Into<String>, outcome: FetchOutcome) -> Self {
        Self {
            file_name: file_name.into(),
            outcome,
        }
    }
}

/// Reads a batch of documents.
///
/// `origin` tags where the resolution runs (e.g. `cli`) so implementations
/// can adjust their behaviour. Entry order is not significant.
pub trait Fetcher {
    fn fetch(&self, paths: &[String], origin: &str) -> impl Future<Output = Vec<Fetched>>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, paths: &[String], origin: &str) -> impl Future<Output = Vec<Fetched>> {
        (**self).fetch(paths, origin)
    }
}

/// Adapter turning a closure into a [`Fetcher`].
pub struct FnFetcher<F>(F);

/// Wrap a closure taking owned paths and origin.
pub fn fetch_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(Vec<String>, String) -> Fut,
    Fut: Future<Output = Vec<Fetched>>,
{
    FnFetcher(f)
}

impl<F, Fut> Fetcher for FnFetcher<F>
where
    F: Fn(Vec<String>, String) -> Fut,
    Fut: Future<Output = Vec<Fetched>>,
{
    fn fetch(&self, paths: &[String], origin: &str) -> impl Future<Output = Vec<Fetched>> {
        (self.0)(paths.to_vec(), origin.to_string())
    }
}

/// In-memory fetcher serving a fixed set of documents.
///
/// Records every batch it receives, which makes download counts observable.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    documents: HashMap<String, String>,
    batches: RefCell<Vec<Vec<String>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `path`.
    pub fn with_document(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.insert(path.into(), content.into());
        self
    }

    /// Batches received so far, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.borrow().clone()
    }

    /// How many times `path` was requested across all batches.
    pub fn request_count(&self, path: &str) -> usize {
        self.batches
            .borrow()
            .iter()
            .flatten()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

impl Fetcher for MemoryFetcher {
    async fn fetch(&self, paths: &[String], _origin: &str) -> Vec<Fetched> {
        self.batches.borrow_mut().push(paths.to_vec());
        paths
            .iter()
            .map(|path| {
                let outcome = FetchOutcome::from_raw(self.documents.get(path).cloned());
                Fetched::new(path.clone(), outcome)
            })
            .collect()
    }
}

/// Fetch a batch of paths with one call to `fetcher`.
///
/// Paths are deduplicated before the call. The result holds exactly one
/// entry per unique path, in request order: a path the fetcher did not
/// answer becomes an error entry and unrequested entries are dropped.
pub async fn download_batch<F>(fetcher: &F, paths: &[String], origin: &str) -> Vec<Fetched>
where
    F: Fetcher + ?Sized,
{
    let mut unique: Vec<String> = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(path) {
            unique.push(path.clone());
        }
    }
    if unique.is_empty() {
        return Vec::new();
    }

    let mut answers: HashMap<String, FetchOutcome> = HashMap::with_capacity(unique.len());
    for fetched in fetcher.fetch(&unique, origin).await {
        if !unique.contains(&fetched.file_name) {
            warn!(path = %fetched.file_name, "fetcher answered a path that was not requested");
            continue;
        }
        answers.entry(fetched.file_name).or_insert(fetched.outcome);
    }

    unique
        .into_iter()
        .map(|path| {
            let outcome = answers
                .remove(&path)
                .unwrap_or_else(|| FetchOutcome::Error("no response".into()));
            Fetched::new(path, outcome)
        })
        .collect()
}
