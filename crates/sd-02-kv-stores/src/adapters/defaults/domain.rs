//! # Defaults Domain
//!
//! The shared physical store behind every [`DefaultsStore`](super::DefaultsStore)
//! attached to it, optionally persisted to a JSON file.
//!
//! ## File Format
//!
//! A pretty-printed JSON object of key to tagged native value:
//!
//! ```json
//! {
//!   "age": { "type": "integer", "value": 30 },
//!   "greeting": { "type": "string", "value": "Hello" }
//! }
//! ```
//!
//! Written atomically via a temp file and rename.

use crate::domain::config::DefaultsConfig;
use crate::domain::errors::StoreError;
use parking_lot::RwLock;
use shared_bus::{ChangeFeed, Subscription};
use shared_types::NativeValue;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identity of whoever mutated the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriterId(Uuid);

impl WriterId {
    /// Changes picked up from the backing file by [`DefaultsDomain::reload`].
    pub const EXTERNAL: WriterId = WriterId(Uuid::nil());

    /// A fresh writer identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WriterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WriterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key changed in the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainChange {
    pub key: String,
    pub writer: WriterId,
}

type Entries = BTreeMap<String, NativeValue>;

/// Shared physical defaults store.
pub struct DefaultsDomain {
    name: String,
    path: Option<PathBuf>,
    config: DefaultsConfig,
    values: RwLock<Entries>,
    /// Set when memory holds changes not yet on disk.
    dirty: AtomicBool,
    changes: ChangeFeed<DomainChange>,
}

impl DefaultsDomain {
    /// A domain that lives only in memory.
    pub fn in_memory(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            path: None,
            config: DefaultsConfig::default(),
            values: RwLock::new(Entries::new()),
            dirty: AtomicBool::new(false),
            changes: ChangeFeed::new(),
        })
    }

    /// Open a domain persisted at `path`.
    ///
    /// A missing file yields an empty domain. A corrupt file is logged and
    /// ignored; the next flush replaces it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>, config: DefaultsConfig) -> Result<Arc<Self>, StoreError> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "defaults".to_owned());

        let values = match Self::load_from_file(&path) {
            Ok(Some(values)) => {
                info!(
                    domain = %name,
                    keys = values.len(),
                    path = %path.display(),
                    "Loaded defaults domain"
                );
                values
            }
            Ok(None) => {
                info!(domain = %name, path = %path.display(), "No existing defaults file");
                Entries::new()
            }
            Err(StoreError::Format { path, reason }) => {
                warn!(
                    domain = %name,
                    path = %path.display(),
                    %reason,
                    "Ignoring malformed defaults file"
                );
                Entries::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Arc::new(Self {
            name,
            path: Some(path),
            config,
            values: RwLock::new(values),
            dirty: AtomicBool::new(false),
            changes: ChangeFeed::new(),
        }))
    }

    /// Domain name (file stem for persisted domains).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file, if persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The raw value under `key`.
    pub fn get(&self, key: &str) -> Option<NativeValue> {
        self.values.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Every key holding a value, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// Overwrite `key` on behalf of `writer` and notify observers.
    pub fn set(&self, key: &str, value: NativeValue, writer: WriterId) {
        self.changes.apply(|| {
            self.values.write().insert(key.to_owned(), value);
            self.dirty.store(true, Ordering::Release);
            Some(DomainChange {
                key: key.to_owned(),
                writer,
            })
        });
        self.flush_if_configured();
    }

    /// Remove `key` on behalf of `writer`. Returns whether anything was
    /// removed; observers hear about it only in that case.
    pub fn remove(&self, key: &str, writer: WriterId) -> bool {
        let mut removed = false;
        self.changes.apply(|| {
            self.values.write().remove(key)?;
            self.dirty.store(true, Ordering::Release);
            removed = true;
            Some(DomainChange {
                key: key.to_owned(),
                writer,
            })
        });
        if removed {
            self.flush_if_configured();
        }
        removed
    }

    /// Observe one key.
    pub fn observe_key<F>(&self, key: &str, observer: F) -> Subscription
    where
        F: Fn(&DomainChange) + Send + Sync + 'static,
    {
        let key = key.to_owned();
        self.changes
            .subscribe_where(move |change| change.key == key, observer)
    }

    /// Observe every key.
    pub fn observe_all<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&DomainChange) + Send + Sync + 'static,
    {
        self.changes.subscribe(observer)
    }

    /// Run `f` with no change being dispatched concurrently.
    pub fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        self.changes.exclusive(f)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.changes.observer_count()
    }

    /// Write pending changes to the backing file.
    ///
    /// In-memory domains and clean domains succeed immediately.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be written.
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let snapshot = self.values.read().clone();
        if let Err(e) = self.save_to_file(path, &snapshot) {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        debug!(domain = %self.name, keys = snapshot.len(), "Flushed defaults domain");
        Ok(())
    }

    /// Re-read the backing file and publish every difference as an external
    /// change. Returns the number of keys that changed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Format` if the file cannot be
    /// read; memory is left untouched.
    pub fn reload(&self) -> Result<usize, StoreError> {
        let Some(path) = &self.path else {
            return Ok(0);
        };
        let on_disk = Self::load_from_file(path)?.unwrap_or_default();

        let mut changed = 0;
        self.changes.apply_all(|| {
            let mut values = self.values.write();
            let mut keys: Vec<String> = values
                .keys()
                .filter(|key| !on_disk.contains_key(*key))
                .cloned()
                .collect();
            keys.extend(
                on_disk
                    .iter()
                    .filter(|(key, value)| values.get(*key) != Some(*value))
                    .map(|(key, _)| key.clone()),
            );
            *values = on_disk;
            self.dirty.store(false, Ordering::Release);
            changed = keys.len();
            keys.into_iter()
                .map(|key| DomainChange {
                    key,
                    writer: WriterId::EXTERNAL,
                })
                .collect()
        });

        if changed > 0 {
            info!(domain = %self.name, changed, "Reloaded defaults domain");
        }
        Ok(changed)
    }

    fn flush_if_configured(&self) {
        if !self.config.flush_on_write {
            return;
        }
        if let Err(e) = self.flush() {
            warn!(domain = %self.name, error = %e, "Flush after write failed");
        }
    }

    fn load_from_file(path: &Path) -> Result<Option<Entries>, StoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Format {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn save_to_file(&self, path: &Path, values: &Entries) -> Result<(), StoreError> {
        if self.config.create_missing_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(values).map_err(|e| StoreError::Format {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        let mut file =
            std::fs::File::create(&temp_path).map_err(|e| StoreError::io(&temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| StoreError::io(&temp_path, e))?;
        file.sync_all().map_err(|e| StoreError::io(&temp_path, e))?;

        std::fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }
}

impl fmt::Debug for DefaultsDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultsDomain")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("keys", &self.values.read().len())
            .finish()
    }
}
