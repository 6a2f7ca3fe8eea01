//! Error types for the MIMIR core library.

use thiserror::Error;

/// Top-level error type for fallible core operations (configuration, I/O).
///
/// The memory store and the character profile never surface errors to their
/// callers; see [`crate::memory::MemoryIoError`] for the recovered kind.
#[derive(Error, Debug)]
pub enum MimirError {
    /// Configuration file could not be parsed or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MimirError>;
