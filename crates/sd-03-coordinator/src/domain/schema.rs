//! # Schemas
//!
//! A [`Schema`] is the explicit, compile-time field registry of one
//! coordinator type. `stored_schema!` generates it; nothing is discovered at
//! runtime.
//!
//! ## Capabilities
//!
//! A capability is an abstract set of fields several schemas can provide
//! under their own keys. Each capability field is a [`CapabilityField`]
//! constant; a schema's [`CapabilityBinding`] table maps it to one of its
//! declared fields.
//!
//! ```text
//! font::IS_BOLD ("FontSettings.isBold")
//!     ├── Preferences  → Preferences::IS_BOLD  ("isBold")
//!     └── EditorPrefs  → EditorPrefs::BOLD     ("editor.bold")
//! ```

use crate::domain::errors::CoordinatorError;
use crate::service::Coordinator;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// The explicit field registry of a coordinator type.
pub trait Schema: Sized + Send + Sync + 'static {
    /// Name used in errors and logs.
    const NAME: &'static str;

    /// Every declared field, in declaration order.
    const FIELDS: &'static [&'static dyn Field<Self>];

    /// Capability fields this schema provides.
    const CAPABILITIES: &'static [CapabilityBinding<Self>] = &[];
}

/// Type-erased view of a declared field.
///
/// Implemented by [`Accessor`](crate::Accessor); lets the coordinator walk
/// its fields without knowing their value types.
pub trait Field<S: Schema>: Send + Sync + 'static {
    fn id(&self) -> &'static str;

    fn key(&self) -> &'static str;

    fn value_type(&self) -> &'static str;

    /// For downcasting back to the typed accessor.
    fn as_any(&self) -> &dyn Any;

    /// Current value and storage state of the field.
    fn snapshot(&self, coordinator: &Coordinator<S>) -> FieldSnapshot;

    /// Write a JSON value through the typed accessor.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::InvalidValue` if `value` does not fit the
    /// field's type.
    fn assign_json(&self, coordinator: &Coordinator<S>, value: Value) -> Result<(), CoordinatorError>;

    /// Move a value stored under `old_key` to this field.
    ///
    /// Returns `Ok(false)` when the field already has a value or nothing is
    /// stored under `old_key`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::Store` if the old value cannot be decoded.
    fn migrate_from(&self, coordinator: &Coordinator<S>, old_key: &str) -> Result<bool, CoordinatorError>;
}

impl<S: Schema> fmt::Debug for dyn Field<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id())
            .field("key", &self.key())
            .field("type", &self.value_type())
            .finish()
    }
}

/// One field as seen by diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSnapshot {
    pub id: &'static str,
    pub key: &'static str,
    pub value_type: &'static str,
    /// Effective value: the stored value, or the default.
    pub value: Value,
    /// Whether anything is persisted under the key.
    pub is_stored: bool,
}

/// A field of an abstract capability, typed by its value.
pub struct CapabilityField<T> {
    id: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> CapabilityField<T> {
    /// `id` must be unique across capabilities, e.g. `"FontSettings.isBold"`.
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _value: PhantomData,
        }
    }

    pub const fn id(&self) -> &'static str {
        self.id
    }
}

impl<T> Clone for CapabilityField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CapabilityField<T> {}

impl<T> fmt::Debug for CapabilityField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityField").field(&self.id).finish()
    }
}

/// Maps a capability field id to a declared field of `S`.
pub struct CapabilityBinding<S: Schema> {
    capability: &'static str,
    field: &'static dyn Field<S>,
}

impl<S: Schema> CapabilityBinding<S> {
    #[doc(hidden)]
    pub const fn new(capability: &'static str, field: &'static dyn Field<S>) -> Self {
        Self { capability, field }
    }

    pub const fn capability(&self) -> &'static str {
        self.capability
    }

    pub fn field(&self) -> &'static dyn Field<S> {
        self.field
    }
}

impl<S: Schema> fmt::Debug for CapabilityBinding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityBinding")
            .field("capability", &self.capability)
            .field("field", &self.field.id())
            .finish()
    }
}
