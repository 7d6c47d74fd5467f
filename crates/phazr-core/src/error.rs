//! Error types for phazr

use thiserror::Error;

/// Main error type for configuration-referential and loading failures.
///
/// Per-operation failures never surface as an `Error`; they are recorded in
/// an [`ExecutionResult`](crate::ExecutionResult) instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Version {0} not found in configuration")]
    VersionNotFound(String),

    #[error("Phase '{0}' not found in configuration")]
    PhaseNotFound(String),

    #[error("Phase '{0}' is defined more than once")]
    DuplicatePhase(String),

    #[error("No versions defined in configuration")]
    NoVersions,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
