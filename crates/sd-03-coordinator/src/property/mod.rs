//! # Stored Property
//!
//! The cache for one key: the last known decoded value, refreshed whenever
//! the store reports a change to the key.
//!
//! ## Notification Order
//!
//! ```text
//! StoreChange{key} ──→ refresh()
//!                        ├─ 1. re-read + decode (default on failure)
//!                        ├─ 2. observers(new value)   ← get() still returns the old value
//!                        └─ 3. cache = new value
//! ```
//!
//! An observer may write the key again from step 2. The nested refresh
//! caches the newer value, and the outer one then leaves the cache alone.
//!
//! Self-initiated writes take the same path: `set` only writes through, and
//! the store's change brings the value back into the cache.


use parking_lot::{Mutex, RwLock};
pub(crate) use sd_01_value_coding::serializes_to_null;
use sd_02_kv_stores::{KeyValueStore, KeyValueStoreExt, StoreChange, StoreError};
use serde::Serialize;
use shared_bus::{ChangeFeed, ChangeStream, Subscription};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use crate::domain::accessor::StoredValue;

/// Cached, observable view of one key of a store.
pub struct StoredProperty<T: StoredValue> {
    key: String,
    default: T,
    /// A `null`-serializing value is stored as "absent" when the default is too.
    default_is_null: bool,
    store: Arc<dyn KeyValueStore>,
    cached: RwLock<T>,
    observers: ChangeFeed<T>,
    /// Bumped on every refresh.
    generation: AtomicU64,
    store_subscription: Mutex<Option<Subscription>>,
}

impl<T: StoredValue> StoredProperty<T> {
    /// Create the cache for `key`, loading its current value.
    ///
    /// An entry that cannot be decoded as `T` is removed and the default
    /// used instead.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, default: T) -> Arc<Self> {
        let key = key.into();
        let property = Arc::new(Self {
            default_is_null: serializes_to_null(&default),
            cached: RwLock::new(default.clone()),
            default,
            store,
            key,
            observers: ChangeFeed::new(),
            generation: AtomicU64::new(0),
            store_subscription: Mutex::new(None),
        });

        // Register and load under the store's gate: no change can be
        // published between the two.
        let weak: Weak<Self> = Arc::downgrade(&property);
        let corrupt = property.store.changes().exclusive(|| {
            let subscription = property.store.observe(
                Some(property.key.as_str()),
                Box::new(move |_: &StoreChange| {
                    if let Some(property) = weak.upgrade() {
                        property.refresh();
                    }
                }),
            );
            *property.store_subscription.lock() = Some(subscription);

            let (value, corrupt) = property.load();
            *property.cached.write() = value;
            corrupt
        });

        if corrupt {
            warn!(key = %property.key, "Removing undecodable stored value");
            property.store.remove_value(&property.key);
        }
        debug!(key = %property.key, "Stored property materialized");
        property
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// The cached value.
    pub fn get(&self) -> T {
        self.cached.read().clone()
    }

    /// Borrow the cached value without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cached.read())
    }

    /// Write `value` through to the store.
    ///
    /// # Panics
    ///
    /// Panics if the store's coder cannot encode the value.
    pub fn set(&self, value: T) {
        if let Err(e) = write_value(self.store.as_ref(), &self.key, &value, self.default_is_null) {
            panic!("cannot store value for key '{}': {e}", self.key);
        }
    }

    /// Read-modify-write against the cached value.
    ///
    /// Not atomic with respect to writers on other threads.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(value);
    }

    /// Remove the stored value; the property falls back to its default.
    pub fn reset(&self) {
        self.store.remove_value(&self.key);
    }

    /// Whether anything is persisted under the key.
    pub fn is_stored(&self) -> bool {
        self.store.has_value(&self.key)
    }

    /// Call `observer` with the current value now, then with every new value.
    #[must_use = "dropping the subscription stops delivery"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.observers.subscribe_replaying(|| self.get(), observer)
    }

    /// Async stream of every new value.
    pub fn stream(&self) -> ChangeStream<T> {
        self.observers.stream()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.observer_count()
    }

    fn load(&self) -> (T, bool) {
        match self.store.value::<T>(&self.key) {
            Ok(Some(value)) => (value, false),
            Ok(None) => (self.default.clone(), false),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored value unreadable, using default");
                (self.default.clone(), true)
            }
        }
    }

    fn refresh(&self) {
        // Held across load, dispatch and cache update: a replaying
        // subscriber never reads a value older than the last event.
        self.observers.exclusive(|| {
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            let (value, _) = self.load();
            self.observers.publish(value.clone());
            if self.generation.load(Ordering::Acquire) == generation {
                *self.cached.write() = value;
            }
        });
    }
}

impl<T: StoredValue + fmt::Debug> fmt::Debug for StoredProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredProperty")
            .field("key", &self.key)
            .field("cached", &*self.cached.read())
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Store `value` under `key`, or remove the entry when both the value and
/// the default serialize to `null`.
pub(crate) fn write_value<T: Serialize + 'static>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    default_is_null: bool,
) -> Result<(), StoreError> {
    if default_is_null && serializes_to_null(value) {
        store.remove_value(key);
        return Ok(());
    }
    store.set_value(key, value)
}
