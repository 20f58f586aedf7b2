//! Error types for collaborator operations

use thiserror::Error;

/// Error returned by connections and pools
#[derive(Error, Debug)]
pub enum LifelineError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl LifelineError {
    /// Whether the error indicates the link to the server itself is broken,
    /// as opposed to a refusal or misuse on an otherwise working link.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            LifelineError::Connection(_) | LifelineError::Io(_) | LifelineError::Timeout(_)
        )
    }
}

/// Result type alias for collaborator operations
pub type Result<T> = std::result::Result<T, LifelineError>;
