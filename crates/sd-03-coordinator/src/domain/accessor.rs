//! # Accessors
//!
//! An [`Accessor`] is the typed handle of one declared field. Accessors are
//! constants generated by [`stored_schema!`](crate::stored_schema); their
//! `id` is the field name, which identifies the field in the coordinator's
//! registry.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Bound every stored field type satisfies.
pub trait StoredValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> StoredValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Typed handle of one field of schema `S`.
pub struct Accessor<S, T> {
    id: &'static str,
    key: &'static str,
    default: fn() -> T,
    _schema: PhantomData<fn() -> S>,
}

impl<S, T> Accessor<S, T> {
    /// Used by `stored_schema!`; prefer declaring fields there.
    #[doc(hidden)]
    pub const fn new(id: &'static str, key: &'static str, default: fn() -> T) -> Self {
        Self {
            id,
            key,
            default,
            _schema: PhantomData,
        }
    }

    /// Registry identity of the field.
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Storage key of the field.
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// A fresh copy of the declared default.
    pub fn default_value(&self) -> T {
        (self.default)()
    }

    /// Name of the value type, for diagnostics.
    pub fn value_type(&self) -> &'static str {
        type_name::<T>()
    }
}

impl<S, T> Clone for Accessor<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for Accessor<S, T> {}

impl<S, T> PartialEq for Accessor<S, T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.key == other.key
    }
}

impl<S, T> Eq for Accessor<S, T> {}

impl<S, T> fmt::Debug for Accessor<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("schema", &type_name::<S>())
            .field("id", &self.id)
            .field("key", &self.key)
            .field("type", &type_name::<T>())
            .finish()
    }
}
