//! # Defaults Store
//!
//! A view of a [`DefaultsDomain`] with its own coder and change feed.
//!
//! ## Lazy Observation
//!
//! ```text
//! first access of "k" ──→ domain.observe_key("k") ──→ forward into own feed
//! observe(None)       ──→ domain.observe_all()     (per-key hooks dropped)
//! ```
//!
//! Keys nobody touches cost nothing. Forwarded changes are tagged `Local`
//! when this store wrote them, `External` otherwise.

use super::domain::{DefaultsDomain, DomainChange, WriterId};
use crate::domain::change::{ChangeOrigin, StoreChange};
use crate::ports::store::{KeyValueStore, StoreObserver};
use parking_lot::Mutex;
use sd_01_value_coding::{JsonValueCoder, SharedCoder, ValueCoder};
use shared_bus::{ChangeFeed, Subscription};
use shared_types::NativeValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
struct Observation {
    per_key: HashMap<String, Subscription>,
    wildcard: Option<Subscription>,
}

/// Key-value store over a shared defaults domain.
pub struct DefaultsStore {
    domain: Arc<DefaultsDomain>,
    writer: WriterId,
    coder: SharedCoder,
    changes: ChangeFeed<StoreChange>,
    observation: Mutex<Observation>,
}

impl DefaultsStore {
    /// Attach to `domain` using [`JsonValueCoder`].
    pub fn new(domain: Arc<DefaultsDomain>) -> Self {
        Self::with_coder(domain, Arc::new(JsonValueCoder))
    }

    /// Attach to `domain` with a custom coder.
    pub fn with_coder(domain: Arc<DefaultsDomain>, coder: SharedCoder) -> Self {
        Self {
            domain,
            writer: WriterId::new(),
            coder,
            changes: ChangeFeed::new(),
            observation: Mutex::new(Observation::default()),
        }
    }

    /// A store over a fresh in-memory domain.
    pub fn in_memory() -> Self {
        Self::new(DefaultsDomain::in_memory("memory"))
    }

    /// The domain this store is attached to.
    pub fn domain(&self) -> &Arc<DefaultsDomain> {
        &self.domain
    }

    /// This store's writer identity.
    pub fn writer(&self) -> WriterId {
        self.writer
    }

    /// Keys with a per-key hook on the domain.
    pub fn observed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.observation.lock().per_key.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether every domain change is forwarded.
    pub fn observes_all_keys(&self) -> bool {
        self.observation.lock().wildcard.is_some()
    }

    fn forwarder(&self) -> impl Fn(&DomainChange) + Send + Sync + 'static {
        let feed = self.changes.clone();
        let writer = self.writer;
        move |change: &DomainChange| {
            let origin = if change.writer == writer {
                ChangeOrigin::Local
            } else {
                ChangeOrigin::External
            };
            feed.publish(StoreChange {
                key: change.key.clone(),
                origin,
            });
        }
    }

    fn ensure_observed(&self, key: &str) {
        let mut observation = self.observation.lock();
        if observation.wildcard.is_some() || observation.per_key.contains_key(key) {
            return;
        }
        let subscription = self.domain.observe_key(key, self.forwarder());
        observation.per_key.insert(key.to_owned(), subscription);
        debug!(domain = %self.domain.name(), key, "Observing defaults key");
    }

    fn ensure_observing_all(&self) {
        // Swap hooks with no dispatch in flight, so nothing is delivered
        // twice or lost.
        self.domain.exclusive(|| {
            let mut observation = self.observation.lock();
            if observation.wildcard.is_some() {
                return;
            }
            observation.wildcard = Some(self.domain.observe_all(self.forwarder()));
            observation.per_key.clear();
            debug!(domain = %self.domain.name(), "Observing every defaults key");
        });
    }
}

impl KeyValueStore for DefaultsStore {
    fn value_coder(&self) -> &dyn ValueCoder {
        self.coder.as_ref()
    }

    fn native_value(&self, key: &str) -> Option<NativeValue> {
        self.ensure_observed(key);
        self.domain.get(key)
    }

    fn set_native_value(&self, key: &str, value: NativeValue) {
        self.ensure_observed(key);
        self.domain.set(key, value, self.writer);
    }

    fn remove_value(&self, key: &str) {
        self.ensure_observed(key);
        self.domain.remove(key, self.writer);
    }

    fn has_value(&self, key: &str) -> bool {
        self.ensure_observed(key);
        self.domain.contains(key)
    }

    fn keys(&self) -> Vec<String> {
        self.domain.keys()
    }

    fn synchronize(&self) -> bool {
        match self.domain.flush() {
            Ok(()) => true,
            Err(e) => {
                warn!(domain = %self.domain.name(), error = %e, "Synchronize failed");
                false
            }
        }
    }

    fn changes(&self) -> &ChangeFeed<StoreChange> {
        &self.changes
    }

    fn observe(&self, key: Option<&str>, observer: StoreObserver) -> Subscription {
        match key {
            Some(key) => {
                self.ensure_observed(key);
                let key = key.to_owned();
                self.changes
                    .subscribe_where(move |change| change.key == key, observer)
            }
            None => {
                self.ensure_observing_all();
                self.changes.subscribe(observer)
            }
        }
    }
}

impl fmt::Debug for DefaultsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultsStore")
            .field("domain", &self.domain.name())
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}
