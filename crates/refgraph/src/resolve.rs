//! Entry points: resolve the reference graph of one root or of many.

use std::path::Path;

use tracing::{debug, info, info_span, Instrument};

use crate::error::ResolveError;
use crate::expand::{keep_reference, DownloadCache, NodeExpander, RefScope, Relocate};
use crate::fetch::Fetcher;
use crate::model::{ResolvedRef, Resolution, SpecNode};
use crate::traverse::traverse;

/// Options for a resolution run.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Reference kinds to follow.
    pub scope: RefScope,
    /// Rewrites followed `$ref` values in each visited document.
    pub relocate: Relocate,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            scope: RefScope::Remote,
            relocate: keep_reference,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: RefScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_relocate(mut self, relocate: Relocate) -> Self {
        self.relocate = relocate;
        self
    }
}

/// Read a root spec from disk. The node is named after the given path.
pub fn load_spec_node(path: &Path) -> Result<SpecNode, ResolveError> {
    let content = std::fs::read_to_string(path)?;
    Ok(SpecNode::new(path.to_string_lossy(), content))
}

fn validate_root(spec_root: &SpecNode) -> Result<(), ResolveError> {
    if spec_root.is_empty() {
        return Err(ResolveError::InvalidInput(format!(
            "root spec '{}' is empty",
            spec_root.file_name
        )));
    }
    Ok(())
}

/// Resolve every document reachable from `spec_root` with default options.
pub async fn resolve_one<F>(
    spec_root: SpecNode,
    origin: &str,
    fetcher: &F,
) -> Result<Resolution, ResolveError>
where
    F: Fetcher + ?Sized,
{
    resolve_one_with_options(spec_root, origin, fetcher, &ResolveOptions::default()).await
}

/// Resolve every document reachable from `spec_root`.
///
/// Fails with `InvalidInput` for an empty root and with `Parse` when any
/// visited document is malformed. Unreachable references are reported in
/// `missing_remote_refs`. The run owns a fresh download cache.
pub async fn resolve_one_with_options<F>(
    spec_root: SpecNode,
    origin: &str,
    fetcher: &F,
    options: &ResolveOptions,
) -> Result<Resolution, ResolveError>
where
    F: Fetcher + ?Sized,
{
    validate_root(&spec_root)?;

    let root_name = spec_root.file_name.clone();
    let span = info_span!("resolve", root = %root_name, origin = %origin);

    let mut cache = DownloadCache::new();
    let mut expander = NodeExpander::new(&mut cache, fetcher, origin)
        .with_scope(options.scope)
        .with_relocate(options.relocate);
    let traversal = traverse(spec_root, &mut expander).instrument(span).await?;

    let mut visited = traversal.traverse_order.into_iter();
    let spec_root = visited.next().ok_or_else(|| {
        ResolveError::InvalidInput(format!("traversal of '{}' produced no root", root_name))
    })?;
    let remote_refs: Vec<ResolvedRef> = visited.map(ResolvedRef::from).collect();

    info!(
        root = %root_name,
        resolved = remote_refs.len(),
        missing = traversal.missing.len(),
        downloads = cache.len(),
        "resolved reference graph"
    );

    Ok(Resolution {
        remote_refs,
        missing_remote_refs: traversal.missing,
        spec_root,
    })
}

/// Resolve several roots with default options.
pub async fn resolve_many<F>(
    spec_roots: Vec<SpecNode>,
    origin: &str,
    fetcher: &F,
) -> Result<Vec<Resolution>, ResolveError>
where
    F: Fetcher + ?Sized,
{
    resolve_many_with_options(spec_roots, origin, fetcher, &ResolveOptions::default()).await
}

/// Resolve several roots one after another.
///
/// Empty roots are dropped silently. Each remaining root gets its own cache
/// and traversal, in input order; a malformed document still aborts the run.
pub async fn resolve_many_with_options<F>(
    spec_roots: Vec<SpecNode>,
    origin: &str,
    fetcher: &F,
    options: &ResolveOptions,
) -> Result<Vec<Resolution>, ResolveError>
where
    F: Fetcher + ?Sized,
{
    let mut results = Vec::with_capacity(spec_roots.len());
    for spec_root in spec_roots {
        if validate_root(&spec_root).is_err() {
            debug!(root = %spec_root.file_name, "skipping empty root spec");
            continue;
        }
        results.push(resolve_one_with_options(spec_root, origin, fetcher, options).await?);
    }
    Ok(results)
}
