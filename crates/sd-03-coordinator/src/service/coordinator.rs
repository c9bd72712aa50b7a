//! # Coordinator
//!
//! Owns one store and one [`StoredProperty`] per declared field, created on
//! first access.

use crate::domain::accessor::{Accessor, StoredValue};
use crate::domain::change::FieldChange;
use crate::domain::config::{CoordinatorConfig, KeyMigration};
use crate::domain::errors::CoordinatorError;
use crate::domain::schema::Schema;
use crate::property::StoredProperty;
use parking_lot::RwLock;
use sd_02_kv_stores::{KeyValueStore, KeyValueStoreExt, StoreChange, StoreError};
use shared_bus::{ChangeFeed, ChangeStream, Subscription};
use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

type ErasedProperty = Arc<dyn Any + Send + Sync>;

/// Typed accessor registry over one store.
pub struct Coordinator<S: Schema> {
    store: Arc<dyn KeyValueStore>,
    properties: RwLock<HashMap<&'static str, ErasedProperty>>,
    changes: ChangeFeed<FieldChange>,
    _store_subscription: Subscription,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> Coordinator<S> {
    /// Build a coordinator over `store`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::DuplicateKey` or `DuplicateField` if the
    /// schema reuses a key or id, and `InvalidKeyPath` if a capability binding
    /// points outside the schema.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Result<Self, CoordinatorError> {
        Self::with_config(store, CoordinatorConfig::default())
    }

    /// Build a coordinator over `store`, running the configured migration.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_config(
        store: Arc<dyn KeyValueStore>,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        validate::<S>()?;

        // The aggregate observer is registered before any property, so it
        // runs before their caches refresh.
        let changes = ChangeFeed::new();
        let declared: HashMap<&'static str, &'static str> =
            S::FIELDS.iter().map(|field| (field.key(), field.id())).collect();
        let feed = changes.clone();
        let store_subscription = store.observe(
            None,
            Box::new(move |change: &StoreChange| {
                if let Some((&key, &id)) = declared.get_key_value(change.key.as_str()) {
                    feed.publish(FieldChange {
                        id,
                        key,
                        origin: change.origin,
                    });
                }
            }),
        );

        let coordinator = Self {
            store,
            properties: RwLock::new(HashMap::new()),
            changes,
            _store_subscription: store_subscription,
            _schema: PhantomData,
        };

        if let Some(KeyMigration::RenamePrefix { from, to }) = &config.key_migration {
            coordinator.migrate_key_prefix(from, to);
        }

        debug!(schema = S::NAME, fields = S::FIELDS.len(), "Coordinator ready");
        Ok(coordinator)
    }

    /// The store every field reads and writes.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// The cached property of `accessor`, created on first use.
    ///
    /// # Panics
    ///
    /// Panics if the registry holds a property of another type under the
    /// accessor's id, which only a hand-built accessor can cause.
    pub fn resolve<T: StoredValue>(&self, accessor: &Accessor<S, T>) -> Arc<StoredProperty<T>> {
        if let Some(existing) = self.properties.read().get(accessor.id()) {
            return downcast(accessor, existing);
        }

        // Materialize outside the registry lock: loading may notify observers.
        let created: ErasedProperty = StoredProperty::new(
            Arc::clone(&self.store),
            accessor.key(),
            accessor.default_value(),
        );
        let mut properties = self.properties.write();
        let entry = properties.entry(accessor.id()).or_insert_with(|| {
            debug!(schema = S::NAME, field = accessor.id(), key = accessor.key(), "Field registered");
            created
        });
        downcast(accessor, entry)
    }

    /// Number of fields materialized so far.
    pub fn materialized_count(&self) -> usize {
        self.properties.read().len()
    }

    /// Cached value of the field.
    pub fn get<T: StoredValue>(&self, accessor: &Accessor<S, T>) -> T {
        self.resolve(accessor).get()
    }

    /// Write `value` through to the store.
    ///
    /// # Panics
    ///
    /// Panics if the store's coder cannot encode the value.
    pub fn set<T: StoredValue>(&self, accessor: &Accessor<S, T>, value: T) {
        self.resolve(accessor).set(value);
    }

    /// Read-modify-write of the field.
    pub fn update<T: StoredValue>(&self, accessor: &Accessor<S, T>, f: impl FnOnce(&mut T)) {
        self.resolve(accessor).update(f);
    }

    /// Storage key of the field.
    pub fn key<T>(&self, accessor: &Accessor<S, T>) -> &'static str {
        accessor.key()
    }

    /// The persisted value, without default substitution.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Coder` if the stored value cannot be read as `T`.
    pub fn stored_value<T: StoredValue>(&self, accessor: &Accessor<S, T>) -> Result<Option<T>, StoreError> {
        self.store.value::<T>(accessor.key())
    }

    /// Whether anything is persisted for the field, readable or not.
    pub fn has_stored_value<T>(&self, accessor: &Accessor<S, T>) -> bool {
        self.store.has_value(accessor.key())
    }

    /// Remove the persisted value; the field reads its default again.
    pub fn remove_stored_value<T>(&self, accessor: &Accessor<S, T>) {
        self.store.remove_value(accessor.key());
    }

    /// Remove every declared field's persisted value.
    pub fn remove_all_stored_values(&self) {
        for field in S::FIELDS {
            self.store.remove_value(field.key());
        }
        info!(schema = S::NAME, "All stored values removed");
    }

    /// Flush the store. See [`KeyValueStore::synchronize`].
    pub fn synchronize(&self) -> bool {
        self.store.synchronize()
    }

    /// Observe one field: the current value now, then every new value.
    #[must_use = "dropping the subscription stops delivery"]
    pub fn subscribe<T, F>(&self, accessor: &Accessor<S, T>, observer: F) -> Subscription
    where
        T: StoredValue,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.resolve(accessor).subscribe(observer)
    }

    /// Async stream of the field's new values.
    pub fn value_stream<T: StoredValue>(&self, accessor: &Accessor<S, T>) -> ChangeStream<T> {
        self.resolve(accessor).stream()
    }

    /// Observe every declared field.
    ///
    /// Fires before the changed field's cache updates.
    #[must_use = "dropping the subscription stops delivery"]
    pub fn on_change<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&FieldChange) + Send + Sync + 'static,
    {
        self.changes.subscribe(observer)
    }

    /// Async stream of changes to declared fields.
    pub fn change_stream(&self) -> ChangeStream<FieldChange> {
        self.changes.stream()
    }
}

fn downcast<S, T: StoredValue>(
    accessor: &Accessor<S, T>,
    property: &ErasedProperty,
) -> Arc<StoredProperty<T>> {
    match Arc::clone(property).downcast::<StoredProperty<T>>() {
        Ok(property) => property,
        Err(_) => panic!(
            "field {} is registered with a type other than {}",
            accessor.id(),
            type_name::<T>()
        ),
    }
}

fn validate<S: Schema>() -> Result<(), CoordinatorError> {
    let mut ids = HashSet::new();
    let mut keys = HashSet::new();
    for field in S::FIELDS {
        if !ids.insert(field.id()) {
            return Err(CoordinatorError::DuplicateField {
                schema: S::NAME,
                id: field.id(),
            });
        }
        if !keys.insert(field.key()) {
            return Err(CoordinatorError::DuplicateKey {
                schema: S::NAME,
                key: field.key(),
            });
        }
    }

    for binding in S::CAPABILITIES {
        if !ids.contains(binding.field().id()) {
            return Err(CoordinatorError::InvalidKeyPath {
                schema: S::NAME,
                capability: binding.capability(),
            });
        }
    }
    Ok(())
}

impl<S: Schema> fmt::Debug for Coordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("schema", &S::NAME)
            .field("materialized", &self.materialized_count())
            .finish_non_exhaustive()
    }
}
