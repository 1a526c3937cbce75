//! Reference graph resolution for multi-file OpenAPI specs.
//!
//! Starting from a root document, follows remote (and optionally external)
//! `$ref` targets, fetches each target once per run, and reports every
//! reachable document in depth-first order along with the references that
//! could not be fetched. Local `#/...` references are never followed and
//! resolved content is never merged into the root.

pub mod error;
pub mod expand;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod parser;
pub mod pointer;
pub mod resolve;
pub mod slots;
pub mod traverse;

pub use error::ResolveError;
pub use expand::{DownloadCache, NodeExpander, RefScope, Relocate};
pub use fetch::{
    download_batch, fetch_fn, FetchOutcome, Fetched, Fetcher, MemoryFetcher, NOT_FOUND_MARKER,
};
pub use model::{RefDescriptor, Resolution, ResolvedRef, SpecNode, Summary};
pub use parser::parse_document;
pub use pointer::{classify, KeyPath, RefKind};
pub use resolve::{
    load_spec_node, resolve_many, resolve_many_with_options, resolve_one,
    resolve_one_with_options, ResolveOptions,
};
pub use slots::{plan_component_slots, ComponentSlot, Placement};
pub use traverse::{traverse, Expand, Expansion, GraphNode, Traversal};
