//! # Store Container
//!
//! Builds the store stack once from [`RuntimeConfig`]:
//!
//! ```text
//! Coordinator<Preferences>
//!   └─ DefaultsStore ── DefaultsDomain (JSON file or memory)
//!        └─ JsonValueCoder [wrapped in CryptoValueCoderDecorator when a key is set]
//! ```

use crate::config::RuntimeConfig;
use crate::schema::Preferences;
use anyhow::{Context, Result};
use sd_01_value_coding::{CryptoValueCoderDecorator, JsonValueCoder, SharedCoder};
use sd_02_kv_stores::{DefaultsDomain, DefaultsStore, KeyValueStore};
use sd_03_coordinator::{Coordinator, CoordinatorConfig, KeyMigration};
use std::sync::Arc;
use tracing::info;

/// Name of the domain when no file is configured.
const IN_MEMORY_DOMAIN: &str = "sd-runtime";

/// Every long-lived service of the runtime.
pub struct Container {
    config: RuntimeConfig,
    domain: Arc<DefaultsDomain>,
    preferences: Coordinator<Preferences>,
}

impl Container {
    /// Open the configured domain and build the coordinator over it.
    ///
    /// # Errors
    ///
    /// Fails if the defaults file cannot be read or the schema is invalid.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let domain = match &config.defaults_path {
            Some(path) => DefaultsDomain::open(path, config.defaults.clone())
                .with_context(|| format!("opening defaults file {}", path.display()))?,
            None => DefaultsDomain::in_memory(IN_MEMORY_DOMAIN),
        };

        let store: Arc<dyn KeyValueStore> =
            Arc::new(DefaultsStore::with_coder(Arc::clone(&domain), build_coder(&config)));

        // Plaintext values written before encryption was enabled move under
        // the encrypted prefix.
        let mut coordinator_config = CoordinatorConfig::new();
        if config.encryption_key.is_some() {
            coordinator_config = coordinator_config
                .with_key_migration(KeyMigration::rename_prefix("", config.encrypted_prefix.clone()));
        }
        let preferences = Coordinator::with_config(store, coordinator_config)
            .context("building the Preferences coordinator")?;

        info!(
            domain = domain.name(),
            persistent = domain.path().is_some(),
            encrypted = config.encryption_key.is_some(),
            "Runtime container ready"
        );
        Ok(Self {
            config,
            domain,
            preferences,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn domain(&self) -> &Arc<DefaultsDomain> {
        &self.domain
    }

    pub fn preferences(&self) -> &Coordinator<Preferences> {
        &self.preferences
    }
}

fn build_coder(config: &RuntimeConfig) -> SharedCoder {
    let json: SharedCoder = Arc::new(JsonValueCoder::new());
    match &config.encryption_key {
        Some(key) => {
            let prefix = config.encrypted_prefix.clone();
            let coder = CryptoValueCoderDecorator::with_secret_key(json, key.clone(), move |k| {
                k.starts_with(prefix.as_str())
            })
            .with_cipher(config.cipher);
            Arc::new(coder)
        }
        None => json,
    }
}
