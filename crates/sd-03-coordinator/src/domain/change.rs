//! # Aggregate Changes

use sd_02_kv_stores::ChangeOrigin;

/// A declared field of a coordinator changed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldChange {
    /// Field id as declared in the schema.
    pub id: &'static str,
    /// Storage key of the field.
    pub key: &'static str,
    pub origin: ChangeOrigin,
}

impl FieldChange {
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.origin == ChangeOrigin::External
    }
}
