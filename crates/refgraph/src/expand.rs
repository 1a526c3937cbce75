//! Expands one document node into the documents it references.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ResolveError;
use crate::extract::{
    find_references, ref_of_kinds, ref_path_without_fragment, relocate_references,
    remote_references,
};
use crate::fetch::{download_batch, FetchOutcome, Fetcher};
use crate::model::{RefDescriptor, SpecNode};
use crate::parser::parse_document;
use crate::pointer::{classify, RefKind};
use crate::traverse::{Expand, Expansion};

/// Rewrites a `$ref` value during relocation.
pub type Relocate = fn(&str) -> String;

/// The default relocation: leave the reference as written.
pub fn keep_reference(reference: &str) -> String {
    reference.to_string()
}

/// Which reference kinds a resolution follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefScope {
    /// Remote URLs only.
    #[default]
    Remote,
    /// Remote URLs and external file paths.
    RemoteAndExternal,
}

impl RefScope {
    /// The reference kinds this scope follows.
    pub fn kinds(self) -> &'static [RefKind] {
        match self {
            Self::Remote => &[RefKind::Remote],
            Self::RemoteAndExternal => &[RefKind::Remote, RefKind::External],
        }
    }
}

/// Fetched content of one resolution run, keyed by reference path.
///
/// Entries are written once and never evicted. Failed fetches are cached too
/// so a broken target is requested only once per run.
#[derive(Debug, Default)]
pub struct DownloadCache {
    entries: HashMap<String, FetchOutcome>,
}

impl DownloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&FetchOutcome> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Store an outcome unless the path is already present.
    pub fn insert(&mut self, path: impl Into<String>, outcome: FetchOutcome) {
        self.entries.entry(path.into()).or_insert(outcome);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identity of a fetched URL: host, port and path without the scheme.
///
/// `https://example.com/models/pet.yaml` becomes `example.com/models/pet.yaml`.
/// Anything that does not parse is returned unchanged.
pub fn local_path_form(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let mut local = parsed.host_str().unwrap_or_default().to_string();
    if let Some(port) = parsed.port() {
        local.push_str(&format!(":{port}"));
    }
    local.push_str(parsed.path());
    if let Some(query) = parsed.query() {
        local.push('?');
        local.push_str(query);
    }
    local
}

/// Resolve a referenced path against the document that references it.
///
/// URLs stay as they are. A relative path is joined onto the parent's URL
/// when the parent was fetched remotely, or onto the parent's directory.
pub fn resolve_against(parent: &SpecNode, path: &str) -> String {
    if classify(path) == RefKind::Remote {
        return path.to_string();
    }
    if let Some(base) = parent.url.as_deref().and_then(|u| Url::parse(u).ok()) {
        if let Ok(joined) = base.join(path) {
            return joined.to_string();
        }
    }
    let target = Path::new(path);
    if target.is_absolute() {
        return normalize_path(target);
    }
    match Path::new(&parent.file_name).parent() {
        Some(dir) => normalize_path(&dir.join(target)),
        None => normalize_path(target),
    }
}

/// Lexically fold `.` and `..` components.
fn normalize_path(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().into_owned()
}

/// Expands spec nodes against a shared download cache.
///
/// One expander serves one root traversal; the cache it borrows must not be
/// shared with another root.
pub struct NodeExpander<'a, F: ?Sized> {
    cache: &'a mut DownloadCache,
    fetcher: &'a F,
    origin: &'a str,
    scope: RefScope,
    relocate: Relocate,
}

impl<'a, F: Fetcher + ?Sized> NodeExpander<'a, F> {
    pub fn new(cache: &'a mut DownloadCache, fetcher: &'a F, origin: &'a str) -> Self {
        Self {
            cache,
            fetcher,
            origin,
            scope: RefScope::default(),
            relocate: keep_reference,
        }
    }

    /// Follow the given reference kinds.
    pub fn with_scope(mut self, scope: RefScope) -> Self {
        self.scope = scope;
        self
    }

    /// Rewrite followed references through `relocate`.
    pub fn with_relocate(mut self, relocate: Relocate) -> Self {
        self.relocate = relocate;
        self
    }

    /// Expand one node.
    ///
    /// Parses the node if needed, fetches every followed reference not yet
    /// in the cache as one batch, relocates the node's references and leaves
    /// the parsed tree on the node. Fetch failures come back as missing
    /// descriptors; a parse failure is returned as an error.
    pub async fn expand_node(
        &mut self,
        node: &mut SpecNode,
    ) -> Result<Expansion<SpecNode, RefDescriptor>, ResolveError> {
        let mut tree = match node.parsed.take() {
            Some(tree) => tree,
            None => parse_document(&node.file_name, &node.content)?,
        };

        let descriptors = self.followed_references(node, &tree);
        if descriptors.is_empty() {
            node.parsed = Some(tree);
            return Ok(Expansion::leaf());
        }

        let to_fetch: Vec<String> = descriptors
            .iter()
            .filter(|d| !self.cache.contains(&d.path))
            .map(|d| d.path.clone())
            .collect();
        debug!(
            node = %node.file_name,
            references = descriptors.len(),
            cached = descriptors.len() - to_fetch.len(),
            fetching = to_fetch.len(),
            "expanding node"
        );

        if !to_fetch.is_empty() {
            for fetched in download_batch(self.fetcher, &to_fetch, self.origin).await {
                self.cache.insert(fetched.file_name, fetched.outcome);
            }
        }

        self.relocate_in(&mut tree);
        node.parsed = Some(tree);

        let mut adjacent = Vec::new();
        let mut missing = Vec::new();
        for descriptor in descriptors {
            let outcome = self.cache.get(&descriptor.path);
            match outcome.and_then(FetchOutcome::content) {
                Some(content) => {
                    adjacent.push(adjacent_node(&descriptor.path, content));
                }
                None => {
                    warn!(
                        node = %node.file_name,
                        reference = %descriptor.path,
                        reason = ?outcome,
                        "reference could not be resolved"
                    );
                    missing.push(descriptor);
                }
            }
        }

        Ok(Expansion::new(adjacent, missing))
    }

    /// Distinct followed references of `tree`, resolved against `node`.
    fn followed_references(&self, node: &SpecNode, tree: &Value) -> Vec<RefDescriptor> {
        if self.scope == RefScope::Remote {
            return remote_references(tree);
        }
        let raw = find_references(tree, ref_of_kinds(self.scope.kinds()), ref_path_without_fragment);
        let mut resolved: Vec<RefDescriptor> = Vec::with_capacity(raw.len());
        for descriptor in raw {
            let path = resolve_against(node, &descriptor.path);
            if !resolved.iter().any(|d| d.path == path) {
                resolved.push(RefDescriptor { path });
            }
        }
        resolved
    }

    fn relocate_in(&self, tree: &mut Value) -> usize {
        relocate_references(tree, ref_of_kinds(self.scope.kinds()), self.relocate)
    }
}

/// Build the graph node for a fetched document.
fn adjacent_node(path: &str, content: &str) -> SpecNode {
    if classify(path) == RefKind::Remote {
        SpecNode::new(local_path_form(path), content).with_url(path)
    } else {
        SpecNode::new(path, content)
    }
}

impl<F: Fetcher + ?Sized> Expand<SpecNode> for NodeExpander<'_, F> {
    type Missing = RefDescriptor;
    type Error = ResolveError;

    async fn expand(
        &mut self,
        node: &mut SpecNode,
    ) -> Result<Expansion<SpecNode, RefDescriptor>, ResolveError> {
        self.expand_node(node).await
    }
}
