//! JSON Pointer algebra for `$ref` values.
//!
//! Classifies references, turns file paths into pointer segments and back,
//! and computes where an externally defined entity would live under
//! `#/components/...`. Everything here is pure and never fails: malformed
//! input falls through to empty or pass-through results.

use serde::Serialize;
use url::Url;

/// Component categories an OpenAPI document may hold under `components`.
pub const COMPONENT_CATEGORIES: &[&str] = &[
    "schemas",
    "responses",
    "parameters",
    "examples",
    "requestBodies",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
];

/// Keys whose value is a schema; they are filed under `schemas`.
pub const SCHEMA_COMPOSITION_KEYS: &[&str] = &[
    "allOf",
    "oneOf",
    "anyOf",
    "not",
    "additionalProperties",
    "items",
    "schema",
];

/// Prefix of every pointer produced by [`to_root_pointer`].
pub const COMPONENTS_POINTER_PREFIX: &str = "#/components/";

/// Top-level key of the components namespace.
const COMPONENTS_KEY: &str = "components";

/// The three mutually exclusive kinds of `$ref` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    /// `#/...` fragment inside the current document.
    Local,
    /// File path, possibly followed by `#fragment`.
    External,
    /// Network-addressable URL.
    Remote,
}

/// Classify a `$ref` value.
pub fn classify(reference: &str) -> RefKind {
    if reference.starts_with('#') {
        RefKind::Local
    } else if is_url(reference) {
        RefKind::Remote
    } else {
        RefKind::External
    }
}

/// Returns true for a local (`#`-prefixed) reference.
pub fn is_local_ref(reference: &str) -> bool {
    classify(reference) == RefKind::Local
}

/// Returns true for a file-path reference.
pub fn is_external_ref(reference: &str) -> bool {
    classify(reference) == RefKind::External
}

/// Returns true for a URL reference.
pub fn is_remote_ref(reference: &str) -> bool {
    classify(reference) == RefKind::Remote
}

/// Strict URL parse first, then a lenient `scheme://host...` split that only
/// requires a non-empty host.
fn is_url(candidate: &str) -> bool {
    if Url::parse(candidate).is_ok() {
        return true;
    }
    lenient_host(candidate).is_some_and(|host| !host.is_empty())
}

/// Extract the authority of `scheme://authority/rest` without validating it.
fn lenient_host(candidate: &str) -> Option<&str> {
    let (scheme, rest) = candidate.split_once("://")?;
    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    // Drop userinfo and port.
    let host = authority.rsplit('@').next().unwrap_or_default();
    Some(host.split(':').next().unwrap_or_default())
}

/// Escape a file path so it can serve as a single pointer segment.
///
/// `~` becomes `~0`, then `/` becomes `~1`, then the result is
/// percent-encoded.
pub fn encode_segment(name: &str) -> String {
    let escaped = name.replace('~', "~0").replace('/', "~1");
    urlencoding::encode(&escaped).into_owned()
}

/// Reverse of [`encode_segment`], in the historical order: `~1` and `~0`
/// are unescaped first and the combined string is percent-decoded last.
///
/// A percent-encoded tilde therefore survives unescaping: `%7E1` decodes
/// to `~1`, not `/`.
pub fn decode_segment(name: &str) -> String {
    let unescaped = name.replace("~1", "/").replace("~0", "~");
    match urlencoding::decode(&unescaped) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => unescaped,
    }
}

/// The part of a reference before its first `#`.
pub fn strip_local_fragment(reference: &str) -> &str {
    reference
        .split_once('#')
        .map(|(path, _)| path)
        .unwrap_or(reference)
}

/// The fragment of a reference after its first `#`, if any.
pub fn local_fragment(reference: &str) -> Option<&str> {
    reference.split_once('#').map(|(_, fragment)| fragment)
}

/// The last segment of a pointer; empty for an absent or empty pointer.
pub fn entity_name(pointer: Option<&str>) -> String {
    match pointer {
        Some(p) if !p.is_empty() => p.rsplit('/').next().unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

/// Location of an entity inside the components namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyPath {
    /// Root-to-leaf segments, e.g. `["schemas", "pet.yaml#/Pet"]`. The last
    /// segment is the entity (file name plus fragment); the rest is the
    /// category chain. Empty when no category matched.
    pub segments: Vec<String>,
    /// The reference already sits under `components`.
    pub in_components: bool,
}

impl KeyPath {
    /// No components placement was computed.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The category chain without the entity segment.
    pub fn category_path(&self) -> &[String] {
        match self.segments.split_last() {
            Some((_, categories)) => categories,
            None => &[],
        }
    }

    /// The entity segment, if a placement was computed.
    pub fn entity(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

/// Compute the components key-path for a reference.
///
/// `ancestors` is the chain of property names from the document root down to
/// the object holding the `$ref`. The entity pseudo-segment (decoded
/// `file_name` plus optional `#local_fragment`) is appended at the leaf end,
/// the chain is scanned leaf-to-root with composition keys normalized to
/// `schemas`, and the scan stops at the first component category. Whitespace
/// is stripped from every segment.
pub fn key_path(ancestors: &[String], file_name: &str, local_fragment: Option<&str>) -> KeyPath {
    if ancestors.first().map(String::as_str) == Some(COMPONENTS_KEY) {
        return KeyPath {
            segments: Vec::new(),
            in_components: true,
        };
    }

    let entity = match local_fragment {
        Some(fragment) if !fragment.is_empty() => decode_segment(&format!("{file_name}#{fragment}")),
        _ => decode_segment(file_name),
    };

    let mut trace = Vec::with_capacity(ancestors.len() + 1);
    for item in std::iter::once(entity.as_str()).chain(ancestors.iter().rev().map(String::as_str)) {
        let stripped: String = item.chars().filter(|c| !c.is_whitespace()).collect();
        let item = if SCHEMA_COMPOSITION_KEYS.contains(&stripped.as_str()) {
            "schemas".to_string()
        } else {
            stripped
        };
        let is_category = COMPONENT_CATEGORIES.contains(&item.as_str());
        trace.push(item);
        if is_category {
            trace.reverse();
            return KeyPath {
                segments: trace,
                in_components: false,
            };
        }
    }

    KeyPath::default()
}

/// Build the root-relative pointer for a reference.
///
/// Local references are already root-relative and pass through unchanged;
/// anything else becomes `#/components/` followed by the encoded trace.
pub fn to_root_pointer<E>(encode: E, reference: &str, trace: &[String]) -> String
where
    E: Fn(&str) -> String,
{
    if reference.starts_with('#') {
        return reference.to_string();
    }
    let joined: Vec<String> = trace.iter().map(|segment| encode(segment)).collect();
    format!("{}{}", COMPONENTS_POINTER_PREFIX, joined.join("/"))
}

/// Pointer to a location in the current document, e.g. `#/paths/~1pets`.
pub fn pointer_from_segments(segments: &[String]) -> String {
    let mut pointer = String::from("#");
    for segment in segments {
        pointer.push('/');
        pointer.push_str(&encode_segment(segment));
    }
    pointer
}
