//! Error types for the plate pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, capturing or exporting plates
#[derive(Error, Debug)]
pub enum Error {
    /// The book document failed to parse or validate
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// An operation needed a loaded book but none is present
    #[error("No document loaded")]
    NoDocument,

    /// A plate could not be rasterized
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// Captured pixels could not be encoded
    #[error("Image encoding failed: {0}")]
    EncodeError(String),

    /// A preview data handle could not be resolved to bytes
    #[error("Failed to resolve preview: {0}")]
    ResolveError(String),

    /// Archive assembly failed
    #[error("Archive assembly failed: {0}")]
    ArchiveError(String),

    /// The save target refused the archive
    #[error("Save failed: {0}")]
    SaveError(String),

    /// Download was requested before a capture pass completed
    #[error("Export is not available until plates have been compiled")]
    ExportNotReady,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidDocument(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("Background task failed: {}", err))
    }
}
