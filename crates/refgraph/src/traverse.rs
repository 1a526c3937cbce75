//! Cycle-safe depth-first traversal over an implicit graph.
//!
//! Edges are discovered on demand: the engine hands each node to an
//! [`Expand`] implementation, which returns the adjacent nodes and any
//! targets it could not reach. The engine only tracks identities, order and
//! the missing list, so it knows nothing about fetching or parsing.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, trace};

use crate::model::SpecNode;

/// A node with a stable identity.
pub trait GraphNode {
    fn id(&self) -> &str;
}

impl GraphNode for SpecNode {
    fn id(&self) -> &str {
        &self.file_name
    }
}

/// Edges produced by expanding one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion<N, M> {
    /// Adjacent nodes, in the order they should be visited.
    pub adjacent: Vec<N>,
    /// Targets that could not be turned into nodes.
    pub missing: Vec<M>,
}

impl<N, M> Expansion<N, M> {
    pub fn new(adjacent: Vec<N>, missing: Vec<M>) -> Self {
        Self { adjacent, missing }
    }

    /// A terminal node.
    pub fn leaf() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Produces the edges of a node, possibly suspending on I/O.
///
/// The node is handed over mutably so the expansion can record what it
/// learned about it (e.g. its parsed tree).
pub trait Expand<N> {
    type Missing;
    type Error;

    fn expand(
        &mut self,
        node: &mut N,
    ) -> impl Future<Output = Result<Expansion<N, Self::Missing>, Self::Error>>;
}

/// Accumulated traversal state.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal<N, M> {
    /// Every visited node, root first, in pre-order.
    pub traverse_order: Vec<N>,
    /// Distinct missing targets, in discovery order.
    pub missing: Vec<M>,
}

/// Walk the graph depth-first from `root`.
///
/// Each identity is expanded at most once: an adjacent node already visited
/// is skipped, which keeps cycles finite and diamonds single. Children are
/// visited in the order the expansion returned them, each subtree finishing
/// before the next sibling starts. The first expansion error aborts the walk.
pub async fn traverse<N, X>(root: N, expander: &mut X) -> Result<Traversal<N, X::Missing>, X::Error>
where
    N: GraphNode,
    X: Expand<N>,
    X::Missing: PartialEq,
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut traverse_order = Vec::new();
    let mut missing: Vec<X::Missing> = Vec::new();
    let mut stack = vec![root];

    while let Some(mut node) = stack.pop() {
        if !visited.insert(node.id().to_string()) {
            trace!(node = node.id(), "already visited");
            continue;
        }

        let expansion = expander.expand(&mut node).await?;
        debug!(
            node = node.id(),
            adjacent = expansion.adjacent.len(),
            missing = expansion.missing.len(),
            "expanded node"
        );

        for target in expansion.missing {
            if !missing.contains(&target) {
                missing.push(target);
            }
        }
        // Reversed so the first child is popped first.
        stack.extend(
            expansion
                .adjacent
                .into_iter()
                .rev()
                .filter(|child| !visited.contains(child.id())),
        );
        traverse_order.push(node);
    }

    Ok(Traversal {
        traverse_order,
        missing,
    })
}
