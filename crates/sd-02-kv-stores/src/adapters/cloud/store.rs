//! # Ubiquitous Store
//!
//! One device's replica of a [`CloudKeyValueBackend`].
//!
//! ## Conflict Rule
//!
//! A key with a local write that has not been pushed yet ignores remote
//! updates; the local value wins and goes out with the next
//! `synchronize()`.
//!
//! Updates are applied in backend sequence order. Each replica remembers the
//! sequence of its own last push per key, and a remote change older than
//! that push is dropped even if it is delivered afterwards. Every replica
//! therefore ends up with the backend's value.

use super::backend::{CloudChange, CloudKeyValueBackend, CloudUpdate, DeviceId};
use crate::domain::change::StoreChange;
use crate::domain::config::CloudSyncConfig;
use crate::domain::errors::StoreError;
use crate::ports::store::KeyValueStore;
use parking_lot::{Mutex, RwLock};
use sd_01_value_coding::{SharedCoder, ValueCoder};
use shared_bus::ChangeFeed;
use shared_types::NativeValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Cloud-synced key-value store.
pub struct UbiquitousStore {
    device: DeviceId,
    backend: Arc<CloudKeyValueBackend>,
    coder: SharedCoder,
    config: CloudSyncConfig,
    replica: RwLock<HashMap<String, NativeValue>>,
    /// Local changes not yet pushed, one per key, in write order.
    pending: Mutex<Vec<CloudChange>>,
    /// Sequence of this device's last push per key. Locked after `pending`.
    pushed: Mutex<HashMap<String, u64>>,
    /// Last backend sequence reflected in the replica.
    applied_through: AtomicU64,
    changes: ChangeFeed<StoreChange>,
    sync_task: Mutex<Option<JoinHandle<()>>>,
}

impl UbiquitousStore {
    /// Connect a new device replica to `backend`.
    ///
    /// Must be called within a Tokio runtime; remote updates are received on
    /// a task spawned there.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoRuntime` outside a Tokio runtime.
    pub fn connect(
        backend: Arc<CloudKeyValueBackend>,
        coder: SharedCoder,
        config: CloudSyncConfig,
    ) -> Result<Arc<Self>, StoreError> {
        let handle = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        // Subscribe before the snapshot so no update falls in between.
        let mut updates = backend.subscribe();
        let (snapshot, through) = backend.snapshot();
        let store = Arc::new(Self {
            device: DeviceId::new(),
            replica: RwLock::new(snapshot),
            applied_through: AtomicU64::new(through),
            backend,
            coder,
            changes: ChangeFeed::with_capacity(config.channel_capacity),
            config,
            pending: Mutex::new(Vec::new()),
            pushed: Mutex::new(HashMap::new()),
            sync_task: Mutex::new(None),
        });

        let weak: Weak<Self> = Arc::downgrade(&store);
        let task = handle.spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(update) => {
                        let Some(store) = weak.upgrade() else { break };
                        store.apply_remote(&update);
                    }
                    Err(RecvError::Lagged(missed)) => {
                        let Some(store) = weak.upgrade() else { break };
                        warn!(device = %store.device, missed, "Cloud updates lagged, resyncing");
                        store.resync();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        *store.sync_task.lock() = Some(task);

        info!(device = %store.device, keys = store.replica.read().len(), "Cloud replica connected");
        Ok(store)
    }

    /// This replica's device identity.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Last backend sequence this replica has caught up with.
    pub fn synced_through(&self) -> u64 {
        self.applied_through.load(Ordering::Acquire)
    }

    /// Keys with local changes not yet pushed.
    pub fn pending_keys(&self) -> Vec<String> {
        self.pending.lock().iter().map(|c| c.key.clone()).collect()
    }

    fn queue(&self, key: &str, value: Option<NativeValue>) {
        let mut pending = self.pending.lock();
        pending.retain(|change| change.key != key);
        pending.push(CloudChange {
            key: key.to_owned(),
            value,
        });
    }

    fn apply_remote(&self, update: &CloudUpdate) {
        self.changes.apply_all(|| {
            if update.sequence <= self.applied_through.load(Ordering::Acquire) {
                return Vec::new();
            }
            self.applied_through.store(update.sequence, Ordering::Release);
            if update.origin == self.device {
                return Vec::new();
            }

            let pending = self.pending.lock();
            let mut pushed = self.pushed.lock();
            let mut replica = self.replica.write();
            let mut published = Vec::with_capacity(update.changes.len());
            for change in &update.changes {
                if pending.iter().any(|local| local.key == change.key) {
                    debug!(key = %change.key, "Remote change ignored, local write pending");
                    continue;
                }
                if pushed.get(&change.key).is_some_and(|&own| own > update.sequence) {
                    debug!(
                        key = %change.key,
                        sequence = update.sequence,
                        "Remote change superseded by own push"
                    );
                    continue;
                }
                let changed = match &change.value {
                    Some(value) => {
                        replica.insert(change.key.clone(), value.clone());
                        true
                    }
                    None => replica.remove(&change.key).is_some(),
                };
                if changed {
                    published.push(StoreChange::external(change.key.clone()));
                }
            }
            pushed.retain(|_, own| *own > update.sequence);
            published
        });
    }

    fn resync(&self) {
        let (snapshot, through) = self.backend.snapshot();
        self.changes.apply_all(|| {
            let pending = self.pending.lock();
            let mut pushed = self.pushed.lock();
            let mut replica = self.replica.write();
            let keep_local = |key: &String| {
                pending.iter().any(|local| &local.key == key)
                    || pushed.get(key).is_some_and(|&own| own > through)
            };

            let mut keys: Vec<String> = replica
                .keys()
                .filter(|key| !snapshot.contains_key(*key) && !keep_local(*key))
                .cloned()
                .collect();
            keys.extend(
                snapshot
                    .iter()
                    .filter(|(key, value)| !keep_local(*key) && replica.get(*key) != Some(*value))
                    .map(|(key, _)| key.clone()),
            );

            for key in &keys {
                match snapshot.get(key) {
                    Some(value) => {
                        replica.insert(key.clone(), value.clone());
                    }
                    None => {
                        replica.remove(key);
                    }
                }
            }
            pushed.retain(|_, own| *own > through);
            self.applied_through.fetch_max(through, Ordering::AcqRel);
            keys.into_iter().map(StoreChange::external).collect()
        });
    }

    fn push_pending(&self) -> Result<usize, StoreError> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(0);
        }
        let sequence = self.backend.push(self.device, pending.clone())?;
        // Recorded before `pending` is released, so the receiving task never
        // sees a key that is neither pending nor marked as pushed.
        let mut pushed = self.pushed.lock();
        for change in pending.iter() {
            pushed.insert(change.key.clone(), sequence);
        }
        let count = pending.len();
        pending.clear();
        Ok(count)
    }
}

impl KeyValueStore for UbiquitousStore {
    fn value_coder(&self) -> &dyn ValueCoder {
        self.coder.as_ref()
    }

    fn native_value(&self, key: &str) -> Option<NativeValue> {
        self.replica.read().get(key).cloned()
    }

    fn set_native_value(&self, key: &str, value: NativeValue) {
        self.changes.apply(|| {
            self.replica.write().insert(key.to_owned(), value.clone());
            self.queue(key, Some(value));
            Some(StoreChange::local(key))
        });
        if self.config.sync_on_write {
            self.synchronize();
        }
    }

    fn remove_value(&self, key: &str) {
        let mut removed = false;
        self.changes.apply(|| {
            self.replica.write().remove(key)?;
            self.queue(key, None);
            removed = true;
            Some(StoreChange::local(key))
        });
        if removed && self.config.sync_on_write {
            self.synchronize();
        }
    }

    fn has_value(&self, key: &str) -> bool {
        self.replica.read().contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.replica.read().keys().cloned().collect()
    }

    fn synchronize(&self) -> bool {
        match self.push_pending() {
            Ok(pushed) => {
                if pushed > 0 {
                    debug!(device = %self.device, pushed, "Pushed local changes");
                }
                true
            }
            Err(e) => {
                warn!(device = %self.device, error = %e, "Cloud synchronize failed");
                false
            }
        }
    }

    fn changes(&self) -> &ChangeFeed<StoreChange> {
        &self.changes
    }
}

impl Drop for UbiquitousStore {
    fn drop(&mut self) {
        if let Some(task) = self.sync_task.get_mut().take() {
            task.abort();
        }
    }
}

impl fmt::Debug for UbiquitousStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UbiquitousStore")
            .field("device", &self.device)
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}
