//! Common error types for WaveDeck

use thiserror::Error;

/// Common result type for WaveDeck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across WaveDeck services
#[derive(Error, Debug)]
pub enum Error {
    /// File is not a recognized audio container type
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// One metadata chunk could not be parsed. Always recovered inside the
    /// resolver; callers never observe this variant from the public
    /// operations.
    #[error("Corrupt chunk: {0}")]
    CorruptChunk(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata failed to serialize during write-back
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}
