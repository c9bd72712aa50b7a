//! # Coding Errors
//!
//! Every variant carries the storage key it was raised for.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Errors raised while translating between typed values and native shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoderError {
    /// The value cannot be represented by this coder.
    #[error("cannot encode value for key '{key}': {reason}")]
    Encode { key: String, reason: String },

    /// The stored payload is malformed.
    #[error("cannot decode value for key '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// The stored shape cannot be read as the requested type.
    #[error("type mismatch for key '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    /// Sealing or opening an encrypted payload failed.
    #[error("crypto failure for key '{key}': {source}")]
    Crypto {
        key: String,
        #[source]
        source: CryptoError,
    },
}

impl CoderError {
    pub(crate) fn encode(key: &str, reason: impl ToString) -> Self {
        CoderError::Encode {
            key: key.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(key: &str, reason: impl ToString) -> Self {
        CoderError::Decode {
            key: key.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn mismatch(key: &str, expected: impl ToString, found: impl ToString) -> Self {
        CoderError::TypeMismatch {
            key: key.to_owned(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn crypto(key: &str, source: CryptoError) -> Self {
        CoderError::Crypto {
            key: key.to_owned(),
            source,
        }
    }

    /// The storage key this error was raised for.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            CoderError::Encode { key, .. }
            | CoderError::Decode { key, .. }
            | CoderError::TypeMismatch { key, .. }
            | CoderError::Crypto { key, .. } => key,
        }
    }

    /// Whether this error was raised while reading a stored value.
    #[must_use]
    pub fn is_read_failure(&self) -> bool {
        !matches!(self, CoderError::Encode { .. })
    }
}
