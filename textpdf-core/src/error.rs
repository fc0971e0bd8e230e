//! Error types for textpdf.

use std::io;
use thiserror::Error;

/// Result type alias for textpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by document generation.
///
/// Out-of-range numeric options are never errors: they are
/// clamped. Overflowing a single-stream page is not an error
/// either: the content is truncated.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or otherwise unusable text or markup.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input exceeds the configured size ceiling.
    #[error("Input too large: {size} bytes (limit {limit})")]
    InputTooLarge { size: usize, limit: usize },

    /// An internal invariant was broken while assembling the
    /// document. The output would be corrupt, so generation
    /// is aborted.
    #[error("PDF assembly failed: {0}")]
    Assembly(String),

    /// Bytes that are not a structurally valid PDF.
    #[error("Malformed PDF: {0}")]
    Malformed(String),

    /// I/O error when reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An options file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
