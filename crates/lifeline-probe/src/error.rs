//! Error types for probe configuration and lifecycle

use thiserror::Error;

pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors returned synchronously to the caller of a probe operation.
///
/// Liveness failures never show up here; they are carried by
/// [`CheckFailure`](crate::CheckFailure) values and probe events.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid probe configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse probe configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Health monitoring is already running")]
    AlreadyRunning,

    #[error("Health monitoring is not running")]
    NotRunning,
}
