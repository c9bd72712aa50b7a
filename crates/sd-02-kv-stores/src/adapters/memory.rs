//! # In-Memory Store
//!
//! Plain map behind one lock. Intended for tests and ephemeral state.

use crate::domain::change::StoreChange;
use crate::ports::store::KeyValueStore;
use parking_lot::RwLock;
use sd_01_value_coding::{JsonValueCoder, SharedCoder, ValueCoder};
use shared_bus::ChangeFeed;
use shared_types::NativeValue;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory key-value store.
///
/// Every mutation and its notification happen under the feed's gate, so
/// all access is effectively serialised behind one mutex.
pub struct InMemoryStore {
    data: RwLock<HashMap<String, NativeValue>>,
    coder: SharedCoder,
    changes: ChangeFeed<StoreChange>,
}

impl InMemoryStore {
    /// Create an empty store using [`JsonValueCoder`].
    pub fn new() -> Self {
        Self::with_coder(Arc::new(JsonValueCoder))
    }

    /// Create an empty store with a custom coder.
    pub fn with_coder(coder: SharedCoder) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            coder,
            changes: ChangeFeed::new(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStore {
    fn value_coder(&self) -> &dyn ValueCoder {
        self.coder.as_ref()
    }

    fn native_value(&self, key: &str) -> Option<NativeValue> {
        self.data.read().get(key).cloned()
    }

    fn set_native_value(&self, key: &str, value: NativeValue) {
        self.changes.apply(|| {
            self.data.write().insert(key.to_owned(), value);
            Some(StoreChange::local(key))
        });
    }

    fn remove_value(&self, key: &str) {
        self.changes.apply(|| {
            self.data
                .write()
                .remove(key)
                .map(|_| StoreChange::local(key))
        });
    }

    fn has_value(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    fn changes(&self) -> &ChangeFeed<StoreChange> {
        &self.changes
    }
}
