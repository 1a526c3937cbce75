use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One physical document in the reference graph.
///
/// `file_name` is the identity key inside a traversal. `parsed` is filled
/// lazily the first time the node is expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecNode {
    /// Identity of the document (a path, or a URL in local path form).
    pub file_name: String,
    /// The URL the document was fetched from, for remote documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Raw YAML/JSON text.
    pub content: String,
    /// Parsed document tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
}

impl SpecNode {
    /// Create a node from raw content.
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            url: None,
            content: content.into(),
            parsed: None,
        }
    }

    /// Create a node from an already parsed tree.
    pub fn from_parsed(file_name: impl Into<String>, parsed: Value) -> Self {
        Self {
            file_name: file_name.into(),
            url: None,
            content: String::new(),
            parsed: Some(parsed),
        }
    }

    /// Set the URL the document came from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The node carries neither content nor a parsed tree.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.parsed.is_none()
    }
}

/// An external or remote reference with its local fragment stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefDescriptor {
    /// Path or URL before the first `#`.
    pub path: String,
}

impl RefDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A document reached from the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRef {
    pub file_name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
}

impl From<SpecNode> for ResolvedRef {
    fn from(node: SpecNode) -> Self {
        Self {
            file_name: node.file_name,
            content: node.content,
            parsed: node.parsed,
        }
    }
}

/// Outcome of resolving one root document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Every document transitively referenced by the root, in traversal order.
    pub remote_refs: Vec<ResolvedRef>,
    /// References that could not be fetched.
    pub missing_remote_refs: Vec<RefDescriptor>,
    /// The root itself, parsed.
    pub spec_root: SpecNode,
}

impl Resolution {
    /// Count resolved and missing references.
    pub fn summary(&self) -> Summary {
        Summary {
            root: self.spec_root.file_name.clone(),
            resolved: self.remote_refs.len(),
            missing: self.missing_remote_refs.len(),
        }
    }

    /// Every reference was fetched.
    pub fn is_complete(&self) -> bool {
        self.missing_remote_refs.is_empty()
    }
}

/// Counts for one resolved root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub root: String,
    pub resolved: usize,
    pub missing: usize,
}
