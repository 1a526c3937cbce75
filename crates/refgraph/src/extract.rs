//! Walks document trees for `$ref` occurrences.
//!
//! Only mappings can hold a `$ref`, so the walkers hand every mapping in the
//! tree (the root included) to the visitor, along with the chain of keys
//! leading to it. Sequence indices appear in the chain as decimal strings.

use serde_json::{Map, Value};

use crate::model::RefDescriptor;
use crate::pointer::{classify, strip_local_fragment, RefKind};

/// The reference keyword.
pub const REF_KEY: &str = "$ref";

/// A `$ref` found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefOccurrence {
    /// The raw `$ref` value.
    pub reference: String,
    /// Keys from the document root down to the mapping holding the `$ref`.
    pub ancestors: Vec<String>,
}

/// Visit every mapping in the tree with its ancestor chain.
pub fn walk<'a, V>(root: &'a Value, visit: &mut V)
where
    V: FnMut(&'a Map<String, Value>, &[String]),
{
    let mut path = Vec::new();
    walk_inner(root, &mut path, visit);
}

fn walk_inner<'a, V>(value: &'a Value, path: &mut Vec<String>, visit: &mut V)
where
    V: FnMut(&'a Map<String, Value>, &[String]),
{
    match value {
        Value::Object(map) => {
            visit(map, path.as_slice());
            for (key, child) in map {
                path.push(key.clone());
                walk_inner(child, path, visit);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                walk_inner(child, path, visit);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Visit every mapping in the tree mutably.
///
/// The visitor runs before the mapping's children are walked, so anything it
/// rewrites is what the children walk sees.
pub fn walk_mut<V>(root: &mut Value, visit: &mut V)
where
    V: FnMut(&mut Map<String, Value>),
{
    match root {
        Value::Object(map) => {
            visit(map);
            for child in map.values_mut() {
                walk_mut(child, visit);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                walk_mut(child, visit);
            }
        }
        _ => {}
    }
}

/// Matcher for `$ref` properties whose value classifies as one of `kinds`.
pub fn ref_of_kinds(kinds: &[RefKind]) -> impl Fn(&str, &Value) -> bool + '_ {
    move |key, value| {
        key == REF_KEY
            && value
                .as_str()
                .is_some_and(|reference| kinds.contains(&classify(reference)))
    }
}

/// Path resolver that strips the local fragment of a node's `$ref`.
pub fn ref_path_without_fragment(node: &Map<String, Value>) -> Option<String> {
    node.get(REF_KEY)
        .and_then(Value::as_str)
        .map(|reference| strip_local_fragment(reference).to_string())
}

/// Collect the distinct reference targets in a tree.
///
/// A mapping contributes when one of its direct properties satisfies
/// `is_match`; `resolve_path` then names the target. Descriptors keep the
/// order of first discovery.
pub fn find_references<C, P>(root: &Value, is_match: C, resolve_path: P) -> Vec<RefDescriptor>
where
    C: Fn(&str, &Value) -> bool,
    P: Fn(&Map<String, Value>) -> Option<String>,
{
    let mut found: Vec<RefDescriptor> = Vec::new();
    walk(root, &mut |node, _| {
        if !node.iter().any(|(key, value)| is_match(key, value)) {
            return;
        }
        if let Some(path) = resolve_path(node) {
            if !found.iter().any(|d| d.path == path) {
                found.push(RefDescriptor { path });
            }
        }
    });
    found
}

/// Distinct remote targets of a tree, fragments stripped.
pub fn remote_references(root: &Value) -> Vec<RefDescriptor> {
    find_references(root, ref_of_kinds(&[RefKind::Remote]), ref_path_without_fragment)
}

/// Rewrite matching `$ref` values in place through `relocate`.
///
/// Returns how many values were rewritten.
pub fn relocate_references<C, R>(root: &mut Value, is_match: C, relocate: R) -> usize
where
    C: Fn(&str, &Value) -> bool,
    R: Fn(&str) -> String,
{
    let mut rewritten = 0;
    walk_mut(root, &mut |node| {
        for (key, value) in node.iter_mut() {
            if !is_match(key, value) {
                continue;
            }
            if let Value::String(reference) = value {
                *reference = relocate(reference);
                rewritten += 1;
            }
        }
    });
    rewritten
}

/// Every `$ref` string in a tree, in walk order, with its ancestors.
pub fn reference_occurrences(root: &Value) -> Vec<RefOccurrence> {
    let mut occurrences = Vec::new();
    walk(root, &mut |node, ancestors| {
        if let Some(reference) = node.get(REF_KEY).and_then(Value::as_str) {
            occurrences.push(RefOccurrence {
                reference: reference.to_string(),
                ancestors: ancestors.to_vec(),
            });
        }
    });
    occurrences
}
