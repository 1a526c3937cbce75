//! Test harnesses for refgraph.
//!
//! Provides `FixtureServer`, a mock HTTP host for remote spec documents, plus
//! end-to-end resolution tests and CLI regression tests for the `refgraph`
//! binary.

#[cfg(test)]
mod cli;
#[cfg(test)]
mod resolution;
pub mod server;

pub use server::{schemas_referencing, FixtureServer, TestError};
