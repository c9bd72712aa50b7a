//! # Encryption Decorator
//!
//! Wraps another coder and seals values for the keys a predicate selects.
//!
//! ```text
//! encode:  Value ──JSON bytes──→ seal(nonce ‖ ct ‖ tag) ──inner.encode_bytes──→ NativeValue::Data
//! decode:  NativeValue ──inner.decode_bytes──→ open ──JSON bytes──→ Value
//! ```
//!
//! Blob, timestamp and float fields seal their tagged `NativeValue` instead,
//! so they come back in the shape they went in. Keys the predicate rejects go
//! straight to the inner coder. A sealed value is always a blob, whatever its
//! original type.

use crate::domain::errors::CoderError;
use crate::ports::coder::{SharedCoder, ValueCoder};
use serde_json::Value;
use shared_crypto::{open, seal, Cipher, CryptoError, SecretKey};
use shared_types::NativeValue;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Decides per storage key whether a value is encrypted.
pub type KeyPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// AEAD decorator around any [`ValueCoder`].
pub struct CryptoValueCoderDecorator {
    inner: SharedCoder,
    key: SecretKey,
    cipher: Cipher,
    should_encrypt: KeyPredicate,
}

impl CryptoValueCoderDecorator {
    /// Build a decorator from raw key material.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` unless `key` is exactly 32
    /// bytes.
    pub fn try_new<P>(inner: SharedCoder, key: &[u8], should_encrypt: P) -> Result<Self, CryptoError>
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Ok(Self {
            inner,
            key: SecretKey::from_slice(key)?,
            cipher: Cipher::default(),
            should_encrypt: Arc::new(should_encrypt),
        })
    }

    /// Build a decorator, treating a malformed key as a programming error.
    ///
    /// # Panics
    ///
    /// Panics unless `key` is exactly 32 bytes.
    pub fn new<P>(inner: SharedCoder, key: &[u8], should_encrypt: P) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        match Self::try_new(inner, key, should_encrypt) {
            Ok(coder) => coder,
            Err(e) => panic!("invalid symmetric key for value encryption: {e}"),
        }
    }

    /// Build a decorator from an already validated key.
    pub fn with_secret_key<P>(inner: SharedCoder, key: SecretKey, should_encrypt: P) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            inner,
            key,
            cipher: Cipher::default(),
            should_encrypt: Arc::new(should_encrypt),
        }
    }

    /// Encrypt every key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` unless `key` is exactly 32
    /// bytes.
    pub fn with_key_prefix(
        inner: SharedCoder,
        key: &[u8],
        prefix: impl Into<String>,
    ) -> Result<Self, CryptoError> {
        let prefix = prefix.into();
        Self::try_new(inner, key, move |k| k.starts_with(prefix.as_str()))
    }

    /// Select the AEAD cipher. Values sealed with one cipher cannot be opened
    /// with the other.
    #[must_use]
    pub fn with_cipher(mut self, cipher: Cipher) -> Self {
        self.cipher = cipher;
        self
    }

    /// Whether values under `key` are encrypted.
    #[must_use]
    pub fn encrypts(&self, key: &str) -> bool {
        (self.should_encrypt)(key)
    }

    fn seal_bytes(&self, plaintext: &[u8], key: &str) -> Result<Vec<u8>, CoderError> {
        debug!(key, cipher = ?self.cipher, "Sealing value");
        seal(self.cipher, &self.key, plaintext).map_err(|e| CoderError::crypto(key, e))
    }

    fn open_bytes(&self, sealed: &[u8], key: &str) -> Result<Vec<u8>, CoderError> {
        open(self.cipher, &self.key, sealed).map_err(|e| CoderError::crypto(key, e))
    }
}

impl ValueCoder for CryptoValueCoderDecorator {
    fn encode(&self, value: Value, key: &str) -> Result<NativeValue, CoderError> {
        if !self.encrypts(key) {
            return self.inner.encode(value, key);
        }
        let plaintext = serde_json::to_vec(&value).map_err(|e| CoderError::encode(key, e))?;
        let sealed = self.seal_bytes(&plaintext, key)?;
        self.inner.encode_bytes(sealed, key)
    }

    fn decode(&self, native: NativeValue, key: &str) -> Result<Value, CoderError> {
        if !self.encrypts(key) {
            return self.inner.decode(native, key);
        }
        let sealed = self.inner.decode_bytes(native, key)?;
        let plaintext = self.open_bytes(&sealed, key)?;
        serde_json::from_slice(&plaintext).map_err(|e| CoderError::decode(key, e))
    }

    fn encode_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<NativeValue, CoderError> {
        if !self.encrypts(key) {
            return self.inner.encode_bytes(bytes, key);
        }
        let sealed = self.seal_bytes(&bytes, key)?;
        self.inner.encode_bytes(sealed, key)
    }

    fn decode_bytes(&self, native: NativeValue, key: &str) -> Result<Vec<u8>, CoderError> {
        let bytes = self.inner.decode_bytes(native, key)?;
        if !self.encrypts(key) {
            return Ok(bytes);
        }
        self.open_bytes(&bytes, key)
    }

    fn encode_native(&self, native: NativeValue, key: &str) -> Result<NativeValue, CoderError> {
        if !self.encrypts(key) {
            return self.inner.encode_native(native, key);
        }
        let plaintext = serde_json::to_vec(&native).map_err(|e| CoderError::encode(key, e))?;
        let sealed = self.seal_bytes(&plaintext, key)?;
        self.inner.encode_bytes(sealed, key)
    }

    fn decode_native(&self, native: NativeValue, key: &str) -> Result<NativeValue, CoderError> {
        if !self.encrypts(key) {
            return self.inner.decode_native(native, key);
        }
        let sealed = self.inner.decode_bytes(native, key)?;
        let plaintext = self.open_bytes(&sealed, key)?;
        serde_json::from_slice(&plaintext).map_err(|e| CoderError::decode(key, e))
    }
}

impl fmt::Debug for CryptoValueCoderDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoValueCoderDecorator")
            .field("cipher", &self.cipher)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
