use thiserror::Error;

/// Errors produced while resolving a spec's reference graph (E2001, E2002).
///
/// Only input validation and document parsing are fatal. Fetch failures are
/// reported as missing references instead.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// E2001: The root document is empty.
    #[error("E2001: invalid input: {0}")]
    InvalidInput(String),

    /// E2002: YAML/JSON parse error.
    #[error("E2002: failed to parse '{file_name}': {message}")]
    Parse { file_name: String, message: String },

    /// I/O error reading a root spec file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
