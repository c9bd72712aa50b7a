//! # Runtime Configuration
//!
//! Read from the environment once at startup. Every variable is optional.

use sd_02_kv_stores::DefaultsConfig;
use shared_crypto::{Cipher, SecretKey};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Prefix marking encrypted keys when `SD_ENCRYPTED_PREFIX` is unset.
pub const DEFAULT_ENCRYPTED_PREFIX: &str = "enc_";

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// JSON file backing the defaults domain; in-memory when `None`.
    pub defaults_path: Option<PathBuf>,
    /// Domain persistence behaviour.
    pub defaults: DefaultsConfig,
    /// Enables value encryption for keys under `encrypted_prefix`.
    pub encryption_key: Option<SecretKey>,
    pub encrypted_prefix: String,
    pub cipher: Cipher,
    /// How often `watch` re-reads the defaults file.
    pub watch_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            defaults_path: None,
            defaults: DefaultsConfig::default(),
            encryption_key: None,
            encrypted_prefix: DEFAULT_ENCRYPTED_PREFIX.to_owned(),
            cipher: Cipher::default(),
            watch_interval: Duration::from_millis(500),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SD_ENCRYPTION_KEY is not valid hex: {0}")]
    KeyNotHex(#[from] hex::FromHexError),

    #[error("SD_ENCRYPTION_KEY must be 32 bytes (64 hex chars): {0}")]
    KeyLength(#[from] shared_crypto::CryptoError),

    #[error("unknown SD_CIPHER '{0}' (expected xchacha20poly1305 or aes256gcm)")]
    UnknownCipher(String),
}

impl RuntimeConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// See [`from_lookup`](Self::from_lookup).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a malformed encryption key or an unknown
    /// cipher name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("SD_DEFAULTS_PATH").filter(|p| !p.is_empty()) {
            config.defaults_path = Some(PathBuf::from(path));
        }

        if let Some(key_hex) = lookup("SD_ENCRYPTION_KEY") {
            let bytes = hex::decode(key_hex.trim())?;
            config.encryption_key = Some(SecretKey::from_slice(&bytes)?);
            info!("Loaded value encryption key from environment");
        }

        if let Some(prefix) = lookup("SD_ENCRYPTED_PREFIX") {
            config.encrypted_prefix = prefix;
        }

        if let Some(cipher) = lookup("SD_CIPHER") {
            config.cipher = match cipher.to_ascii_lowercase().as_str() {
                "xchacha20poly1305" | "xchacha" => Cipher::XChaCha20Poly1305,
                "aes256gcm" | "aes" => Cipher::Aes256Gcm,
                _ => return Err(ConfigError::UnknownCipher(cipher)),
            };
        }

        Ok(config)
    }
}
