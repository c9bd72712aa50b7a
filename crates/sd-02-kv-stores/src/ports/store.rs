//! # Key-Value Store Port
//!
//! Abstract interface for string-keyed storage of native values.
//!
//! All methods take `&self`: one store is shared by every cached property
//! of a coordinator, so implementations synchronise internally.

use crate::domain::change::StoreChange;
use crate::domain::errors::StoreError;
use sd_01_value_coding::{ValueCoder, ValueCoderExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_bus::{ChangeFeed, Subscription};
use shared_types::NativeValue;

/// Callback registered through [`KeyValueStore::observe`].
pub type StoreObserver = Box<dyn Fn(&StoreChange) + Send + Sync>;

/// Abstract interface for key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// The coder used by the typed extension.
    fn value_coder(&self) -> &dyn ValueCoder;

    /// Raw stored value, if any.
    fn native_value(&self, key: &str) -> Option<NativeValue>;

    /// Overwrite the value for `key` and announce the change.
    fn set_native_value(&self, key: &str, value: NativeValue);

    /// Delete the value for `key`.
    ///
    /// Idempotent. A change is announced only if something was removed.
    fn remove_value(&self, key: &str);

    /// Whether anything is stored under `key`, decodable or not.
    fn has_value(&self, key: &str) -> bool {
        self.native_value(key).is_some()
    }

    /// Every key currently holding a value.
    fn keys(&self) -> Vec<String>;

    /// Best-effort flush to durable or remote storage.
    ///
    /// Reads in this process never depend on it.
    fn synchronize(&self) -> bool {
        true
    }

    /// The store's change feed.
    fn changes(&self) -> &ChangeFeed<StoreChange>;

    /// Observe one key (`Some`) or every key (`None`).
    ///
    /// Stores that watch their backing lazily override this to start
    /// watching before registering.
    fn observe(&self, key: Option<&str>, observer: StoreObserver) -> Subscription {
        match key {
            Some(key) => {
                let key = key.to_owned();
                self.changes()
                    .subscribe_where(move |change| change.key == key, observer)
            }
            None => self.changes().subscribe(observer),
        }
    }
}

/// Typed access through the store's coder.
pub trait KeyValueStoreExt: KeyValueStore {
    /// Read and decode the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Coder` if the stored shape cannot be read as `T`.
    fn value<T: DeserializeOwned + 'static>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(native) = self.native_value(key) else {
            return Ok(None);
        };
        Ok(Some(self.value_coder().decode_value(native, key)?))
    }

    /// Encode and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Coder` wrapping `CoderError::Encode` if the coder
    /// cannot represent the value.
    fn set_value<T: Serialize + ?Sized + 'static>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let native = self.value_coder().encode_value(value, key)?;
        self.set_native_value(key, native);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}
