//! # Coordinator Errors

use sd_02_kv_stores::StoreError;
use thiserror::Error;

/// Errors that can occur while building or querying a coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Two fields of a schema share a storage key.
    #[error("schema {schema} declares key '{key}' more than once")]
    DuplicateKey {
        schema: &'static str,
        key: &'static str,
    },

    /// Two fields of a schema share a field id.
    #[error("schema {schema} declares field {id} more than once")]
    DuplicateField {
        schema: &'static str,
        id: &'static str,
    },

    /// The schema maps no field to this capability field.
    #[error("capability field {capability} is not mapped by schema {schema}")]
    InvalidKeyPath {
        schema: &'static str,
        capability: &'static str,
    },

    /// The mapped field holds a different value type.
    #[error("capability field {capability} expects {expected}, schema field is {found}")]
    TypeMismatch {
        capability: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// No declared field has this id or key.
    #[error("schema {schema} has no field named '{name}'")]
    UnknownField { schema: &'static str, name: String },

    /// A JSON value does not fit the field's type.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
