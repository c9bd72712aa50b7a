//! # Store Errors

use sd_01_value_coding::CoderError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's coder rejected a value.
    #[error(transparent)]
    Coder(#[from] CoderError),

    /// Reading or writing a backing file failed.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backing file exists but is not a defaults document.
    #[error("malformed defaults file {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Cloud sync needs a Tokio runtime to receive remote changes.
    #[error("no Tokio runtime available to drive cloud sync")]
    NoRuntime,

    /// The cloud backend refused a push.
    #[error("cloud backend unavailable")]
    Offline,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// The coder error behind this failure, if any.
    #[must_use]
    pub fn as_coder_error(&self) -> Option<&CoderError> {
        match self {
            StoreError::Coder(e) => Some(e),
            _ => None,
        }
    }
}
