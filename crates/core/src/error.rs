//! Error types for the volume profile system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the volume profile system.
#[derive(Error, Debug)]
pub enum Error {
    /// Profile source does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Malformed row or header content.
    #[error("Format error: {0}")]
    Format(String),

    /// Parseable but domain-invalid profile (totals, gaps, session durations).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query called with a malformed time range.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Loading a named source failed.
    #[error("Failed to load profile from {source_name}: {cause}")]
    Load {
        source_name: String,
        #[source]
        cause: Box<Error>,
    },
}

impl Error {
    /// Create a source-not-found error.
    pub fn source_not_found(msg: impl Into<String>) -> Self {
        Error::SourceNotFound(msg.into())
    }

    /// Create a format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an invalid range error.
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Error::InvalidRange(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Wrap a failure with the name of the source being loaded.
    pub fn load(source_name: impl Into<String>, cause: Error) -> Self {
        Error::Load {
            source_name: source_name.into(),
            cause: Box::new(cause),
        }
    }

    /// Innermost error, looking through `Load` wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Load { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
