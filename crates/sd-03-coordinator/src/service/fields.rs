//! # Field Operations
//!
//! Operations over every declared field without knowing their types:
//! diagnostics, JSON writes and prefix migration.

use super::Coordinator;
use crate::domain::accessor::{Accessor, StoredValue};
use crate::domain::errors::CoordinatorError;
use crate::domain::schema::{Field, FieldSnapshot, Schema};
use crate::property::{serializes_to_null, write_value};
use sd_02_kv_stores::KeyValueStoreExt;
use serde_json::Value;
use std::any::Any;
use tracing::{info, warn};

impl<S: Schema, T: StoredValue> Field<S> for Accessor<S, T> {
    fn id(&self) -> &'static str {
        Accessor::id(self)
    }

    fn key(&self) -> &'static str {
        Accessor::key(self)
    }

    fn value_type(&self) -> &'static str {
        Accessor::value_type(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn snapshot(&self, coordinator: &Coordinator<S>) -> FieldSnapshot {
        let value = coordinator
            .resolve(self)
            .read(|value| serde_json::to_value(value))
            .unwrap_or(Value::Null);
        FieldSnapshot {
            id: Accessor::id(self),
            key: Accessor::key(self),
            value_type: Accessor::value_type(self),
            value,
            is_stored: coordinator.has_stored_value(self),
        }
    }

    fn assign_json(&self, coordinator: &Coordinator<S>, value: Value) -> Result<(), CoordinatorError> {
        let typed: T = serde_json::from_value(value).map_err(|e| CoordinatorError::InvalidValue {
            key: Accessor::key(self),
            reason: e.to_string(),
        })?;
        let property = coordinator.resolve(self);
        write_value(
            coordinator.store().as_ref(),
            property.key(),
            &typed,
            serializes_to_null(property.default_value()),
        )?;
        Ok(())
    }

    fn migrate_from(&self, coordinator: &Coordinator<S>, old_key: &str) -> Result<bool, CoordinatorError> {
        let store = coordinator.store();
        if store.has_value(Accessor::key(self)) {
            return Ok(false);
        }
        let Some(value) = store.value::<T>(old_key)? else {
            return Ok(false);
        };
        write_value(
            store.as_ref(),
            Accessor::key(self),
            &value,
            serializes_to_null(&self.default_value()),
        )?;
        store.remove_value(old_key);
        Ok(true)
    }
}

impl<S: Schema> Coordinator<S> {
    /// Every declared field.
    pub fn fields(&self) -> &'static [&'static dyn Field<S>] {
        S::FIELDS
    }

    /// The declared field with this id or storage key.
    pub fn field(&self, name: &str) -> Option<&'static dyn Field<S>> {
        S::FIELDS
            .iter()
            .copied()
            .find(|field| field.id() == name || field.key() == name)
    }

    /// Effective value and storage state of every declared field.
    pub fn snapshot(&self) -> Vec<FieldSnapshot> {
        S::FIELDS.iter().map(|field| field.snapshot(self)).collect()
    }

    /// Write a field, named by id or key, from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::UnknownField` if no field has that name and
    /// `InvalidValue` if `value` does not fit the field's type.
    pub fn set_json(&self, name: &str, value: Value) -> Result<(), CoordinatorError> {
        let field = self.field(name).ok_or_else(|| CoordinatorError::UnknownField {
            schema: S::NAME,
            name: name.to_owned(),
        })?;
        field.assign_json(self, value)
    }

    /// Move values stored under `from + rest` to declared keys `to + rest`.
    ///
    /// Values go through the typed accessor, so the store's coder re-encodes
    /// them for the new key. Fields that already hold a value are left alone.
    /// Returns the number of values moved.
    pub fn migrate_key_prefix(&self, from: &str, to: &str) -> usize {
        let mut moved = 0;
        for field in S::FIELDS {
            let Some(rest) = field.key().strip_prefix(to) else {
                continue;
            };
            let old_key = format!("{from}{rest}");
            if old_key == field.key() {
                continue;
            }
            match field.migrate_from(self, &old_key) {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(schema = S::NAME, from = %old_key, to = field.key(), error = %e, "Key migration skipped");
                }
            }
        }
        if moved > 0 {
            info!(schema = S::NAME, from, to, moved, "Migrated stored keys");
        }
        moved
    }
}
