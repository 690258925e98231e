use std::io;
use thiserror::Error;

#[cfg(feature = "http")]
use crate::http::HttpError;

/// Error type for import and reconciliation operations.
///
/// Messy but parseable input (ragged rows, unmatched columns, blank rows) is
/// never an error; it is reported through [`crate::ImportOutcome`] instead.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// IO error while reading the source.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// CSV tokenizing error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP error while fetching a remote source.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Error raised by a caller-supplied row source.
    #[error("Row source error: {0}")]
    Source(Box<dyn std::error::Error + Send + Sync>),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Malformed dialect configuration file.
    #[error("Invalid configuration file: {0}")]
    ConfigFile(#[from] serde_json::Error),

    /// Structurally invalid call input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A dialect name that is not registered was requested.
    #[error("Invalid CSV dialect requested: {0}")]
    UnknownDialect(String),
}

impl ReconcileError {
    /// Wrap an error produced by a caller-supplied row source.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ReconcileError::Source(Box::new(err))
    }

    /// Returns true if the error came from the input source rather than from
    /// configuration or call arguments.
    pub fn is_source(&self) -> bool {
        match self {
            ReconcileError::Io(_) | ReconcileError::Csv(_) | ReconcileError::Source(_) => true,
            #[cfg(feature = "http")]
            ReconcileError::Http(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
