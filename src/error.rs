//! Error types for the tiered cache

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], for front ends that need to map
/// failures onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The slow tier could not read, write, encode or delete a value
    StorageFailure,
    /// A query required a tracked key (or a non-empty table) and did not get one
    PreconditionViolation,
    /// Configuration could not be loaded or is invalid
    Configuration,
}

/// Errors that can occur in the tiered cache
#[derive(Error, Debug)]
pub enum Error {
    /// Slow-tier I/O failure
    #[error("Storage failure while trying to {operation} {}: {source}", path.display())]
    Storage {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be encoded or decoded for the slow tier
    #[error("Failed to {operation} cached value: {reason}")]
    Codec {
        operation: &'static str,
        reason: String,
    },

    /// Contract precondition not met
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// I/O error outside the slow tier (configuration, directories)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn storage(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Storage {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn codec(operation: &'static str, reason: impl ToString) -> Self {
        Error::Codec {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Storage { .. } | Error::Codec { .. } => ErrorKind::StorageFailure,
            Error::PreconditionViolation(_) => ErrorKind::PreconditionViolation,
            Error::Config(_) | Error::ConfigFile { .. } | Error::Io(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// True for slow-tier failures
    pub fn is_storage_failure(&self) -> bool {
        self.kind() == ErrorKind::StorageFailure
    }
}
