//! # Store Configuration
//!
//! All configuration values have sensible defaults; tune with the `with_*`
//! builders.

use shared_bus::DEFAULT_CHANNEL_CAPACITY;

/// Configuration for a [`DefaultsDomain`](crate::DefaultsDomain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsConfig {
    /// Write the backing file after every mutation (default: false).
    ///
    /// When `false`, changes reach disk on `synchronize()`.
    pub flush_on_write: bool,

    /// Create missing parent directories of the backing file (default: true).
    pub create_missing_dirs: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            flush_on_write: false,
            create_missing_dirs: true,
        }
    }
}

impl DefaultsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush after every mutation.
    pub fn with_flush_on_write(mut self, flush: bool) -> Self {
        self.flush_on_write = flush;
        self
    }

    /// Create missing parent directories when flushing.
    pub fn with_create_missing_dirs(mut self, create: bool) -> Self {
        self.create_missing_dirs = create;
        self
    }
}

/// Configuration for an [`UbiquitousStore`](crate::UbiquitousStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudSyncConfig {
    /// Push every local change immediately (default: false).
    pub sync_on_write: bool,

    /// Events buffered per async stream of the store's change feed
    /// (default: 256).
    pub channel_capacity: usize,
}

impl Default for CloudSyncConfig {
    fn default() -> Self {
        Self {
            sync_on_write: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl CloudSyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push every local change immediately.
    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Set the feed capacity for this store's async streams.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}
