//! # Capability Resolution
//!
//! Maps a [`CapabilityField`] to the schema's concrete accessor through the
//! schema's static capability table. The table never changes, so a
//! capability field always resolves to the same key.

use super::Coordinator;
use crate::domain::accessor::{Accessor, StoredValue};
use crate::domain::errors::CoordinatorError;
use crate::domain::schema::{CapabilityField, Schema};
use shared_bus::Subscription;
use std::any::type_name;

impl<S: Schema> Coordinator<S> {
    /// The concrete accessor bound to `capability`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::InvalidKeyPath` if the schema does not map
    /// the capability field, and `TypeMismatch` if the mapped field holds a
    /// different type.
    pub fn resolve_capability<T: StoredValue>(
        &self,
        capability: &CapabilityField<T>,
    ) -> Result<Accessor<S, T>, CoordinatorError> {
        let binding = S::CAPABILITIES
            .iter()
            .find(|binding| binding.capability() == capability.id())
            .ok_or(CoordinatorError::InvalidKeyPath {
                schema: S::NAME,
                capability: capability.id(),
            })?;

        let field = binding.field();
        field
            .as_any()
            .downcast_ref::<Accessor<S, T>>()
            .copied()
            .ok_or(CoordinatorError::TypeMismatch {
                capability: capability.id(),
                expected: type_name::<T>(),
                found: field.value_type(),
            })
    }

    /// Storage key behind `capability`.
    ///
    /// # Errors
    ///
    /// See [`resolve_capability`](Self::resolve_capability).
    pub fn capability_key<T: StoredValue>(
        &self,
        capability: &CapabilityField<T>,
    ) -> Result<&'static str, CoordinatorError> {
        self.resolve_capability(capability).map(|accessor| accessor.key())
    }

    /// Cached value behind `capability`.
    ///
    /// # Errors
    ///
    /// See [`resolve_capability`](Self::resolve_capability).
    pub fn get_capability<T: StoredValue>(
        &self,
        capability: &CapabilityField<T>,
    ) -> Result<T, CoordinatorError> {
        let accessor = self.resolve_capability(capability)?;
        Ok(self.get(&accessor))
    }

    /// Write the field behind `capability`.
    ///
    /// # Errors
    ///
    /// See [`resolve_capability`](Self::resolve_capability).
    pub fn set_capability<T: StoredValue>(
        &self,
        capability: &CapabilityField<T>,
        value: T,
    ) -> Result<(), CoordinatorError> {
        let accessor = self.resolve_capability(capability)?;
        self.set(&accessor, value);
        Ok(())
    }

    /// Observe the field behind `capability`.
    ///
    /// # Errors
    ///
    /// See [`resolve_capability`](Self::resolve_capability).
    pub fn subscribe_capability<T, F>(
        &self,
        capability: &CapabilityField<T>,
        observer: F,
    ) -> Result<Subscription, CoordinatorError>
    where
        T: StoredValue,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let accessor = self.resolve_capability(capability)?;
        Ok(self.subscribe(&accessor, observer))
    }
}
