//! # Cloud Backend
//!
//! In-process stand-in for a cloud key-value service: the authoritative map
//! plus a broadcast of every accepted update.

use crate::domain::errors::StoreError;
use parking_lot::RwLock;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_types::NativeValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Identity of one device replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One key's new value; `None` deletes it.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudChange {
    pub key: String,
    pub value: Option<NativeValue>,
}

/// A batch of changes pushed by one device.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudUpdate {
    pub origin: DeviceId,
    /// Position in the backend's total order of accepted pushes, from 1.
    pub sequence: u64,
    pub changes: Vec<CloudChange>,
}

/// Shared cloud key-value service.
pub struct CloudKeyValueBackend {
    values: RwLock<HashMap<String, NativeValue>>,
    updates: broadcast::Sender<Arc<CloudUpdate>>,
    online: AtomicBool,
    /// Sequence of the last accepted push. Only advanced under `values`.
    sequence: AtomicU64,
}

impl CloudKeyValueBackend {
    /// Create a backend with default update buffering.
    pub fn new() -> Arc<Self> {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a backend buffering `capacity` updates per device.
    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        let (updates, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self {
            values: RwLock::new(HashMap::new()),
            updates,
            online: AtomicBool::new(true),
            sequence: AtomicU64::new(0),
        })
    }

    /// Accept `changes` from `origin`, stamp them with the next sequence
    /// number and fan them out to every device.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Offline` while the backend is offline.
    pub fn push(&self, origin: DeviceId, changes: Vec<CloudChange>) -> Result<u64, StoreError> {
        if !self.is_online() {
            return Err(StoreError::Offline);
        }

        // Apply and send under one lock so every device sees pushes in
        // sequence order.
        let mut values = self.values.write();
        for change in &changes {
            match &change.value {
                Some(value) => {
                    values.insert(change.key.clone(), value.clone());
                }
                None => {
                    values.remove(&change.key);
                }
            }
        }
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(%origin, sequence, changes = changes.len(), "Cloud update accepted");
        // No devices connected is fine.
        let _ = self.updates.send(Arc::new(CloudUpdate {
            origin,
            sequence,
            changes,
        }));
        Ok(sequence)
    }

    /// Current authoritative contents, with the sequence of the last push
    /// they include.
    pub fn snapshot(&self) -> (HashMap<String, NativeValue>, u64) {
        let values = self.values.read();
        (values.clone(), self.sequence.load(Ordering::Acquire))
    }

    pub fn value(&self, key: &str) -> Option<NativeValue> {
        self.values.read().get(key).cloned()
    }

    /// Receive every update accepted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<CloudUpdate>> {
        self.updates.subscribe()
    }

    /// Simulate losing or regaining connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Number of accepted pushes, which is also the last sequence number.
    pub fn pushes(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CloudKeyValueBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudKeyValueBackend")
            .field("keys", &self.values.read().len())
            .field("online", &self.is_online())
            .finish()
    }
}
