//! Error types for the CivicNexus query pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while answering a citizen query.
#[derive(Error, Debug)]
pub enum Error {
    /// Text generation backend error
    #[error("Generation error: {0}")]
    Generation(String),

    /// Embedding backend error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error, including credentials rejected by a backend
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Whether a live backend should stay disabled after this error.
    pub fn is_sticky(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
