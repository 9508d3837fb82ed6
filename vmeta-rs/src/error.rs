//! Error types for meta file resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for meta file operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, resolving or saving meta files.
#[derive(Error, Debug)]
pub enum Error {
    /// Input path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Malformed markup.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Document root is not one of the recognized meta file kinds.
    #[error("validation error: {0}")]
    Validation(String),

    /// Every identifier in an allocation range is already claimed.
    #[error("identifier range {min}..={max} is exhausted")]
    ExhaustedRange { min: i64, max: i64 },

    /// Persisting a document failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration file.
    #[error("config error: {0}")]
    Config(String),
}
