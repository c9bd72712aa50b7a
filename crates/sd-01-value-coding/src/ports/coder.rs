//! # Value Coder Port
//!
//! The interface every store uses to turn values into native shapes.

use crate::domain::errors::CoderError;
use crate::domain::native::{from_native, NativeForm};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::{NativeKind, NativeValue};
use std::any::type_name;
use std::sync::Arc;

/// Coder shared between a store and the decorators wrapping it.
pub type SharedCoder = Arc<dyn ValueCoder>;

/// Translates values to and from the store's native representation.
///
/// Both directions receive the storage key so a decorator can apply a
/// per-key policy.
pub trait ValueCoder: Send + Sync {
    /// Encode a JSON value into a native shape.
    ///
    /// # Errors
    ///
    /// Returns `CoderError::Encode` if the value cannot be represented.
    fn encode(&self, value: Value, key: &str) -> Result<NativeValue, CoderError>;

    /// Decode a native shape back into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `CoderError::Decode` for a malformed payload and
    /// `CoderError::Crypto` if an encrypted payload cannot be opened.
    fn decode(&self, native: NativeValue, key: &str) -> Result<Value, CoderError>;

    /// Store an opaque blob. Decorators whose output is binary hand their
    /// payload to the inner coder through here.
    ///
    /// # Errors
    ///
    /// Coders that transform blobs may fail like [`encode`](Self::encode).
    fn encode_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<NativeValue, CoderError> {
        let _ = key;
        Ok(NativeValue::Data(bytes))
    }

    /// Read back a blob stored with [`encode_bytes`](Self::encode_bytes).
    ///
    /// # Errors
    ///
    /// Returns `CoderError::TypeMismatch` if the native value is not a blob.
    fn decode_bytes(&self, native: NativeValue, key: &str) -> Result<Vec<u8>, CoderError> {
        match native {
            NativeValue::Data(bytes) => Ok(bytes),
            other => Err(CoderError::mismatch(key, NativeKind::Data, other.kind())),
        }
    }

    /// Store a value that already has its native shape (a blob, timestamp
    /// or float field).
    ///
    /// # Errors
    ///
    /// Coders that transform native values may fail like
    /// [`encode`](Self::encode).
    fn encode_native(&self, native: NativeValue, key: &str) -> Result<NativeValue, CoderError> {
        let _ = key;
        Ok(native)
    }

    /// Read back a value stored with [`encode_native`](Self::encode_native).
    ///
    /// # Errors
    ///
    /// Coders that transform native values may fail like
    /// [`decode`](Self::decode).
    fn decode_native(&self, native: NativeValue, key: &str) -> Result<NativeValue, CoderError> {
        let _ = key;
        Ok(native)
    }
}

/// What a null blob, timestamp or float field is stored as.
const NULL_PAYLOAD: &[u8] = b"null";

/// Typed surface over any [`ValueCoder`], including `dyn ValueCoder`.
///
/// Blob, timestamp and float fields take the native path
/// ([`encode_native`](ValueCoder::encode_native)) and are stored as `Data`,
/// `Date` and `Float`. Everything else goes through JSON. A null on the
/// native path is stored as the blob `null`, so an `Option<Vec<u8>>` holding
/// exactly those four bytes reads back as `None`.
pub trait ValueCoderExt: ValueCoder {
    /// Serialize `value` and encode it for `key`.
    ///
    /// # Errors
    ///
    /// Returns `CoderError::Encode` if serialization or encoding fails.
    fn encode_value<T: Serialize + ?Sized + 'static>(
        &self,
        value: &T,
        key: &str,
    ) -> Result<NativeValue, CoderError> {
        let Some(form) = NativeForm::of::<T>() else {
            let json = serde_json::to_value(value).map_err(|e| CoderError::encode(key, e))?;
            return self.encode(json, key);
        };
        let native = form
            .to_native(value)
            .map_err(|e| CoderError::encode(key, e))?
            .unwrap_or_else(|| NativeValue::Data(NULL_PAYLOAD.to_vec()));
        self.encode_native(native, key)
    }

    /// Decode `native` for `key` and reinterpret it as `T`.
    ///
    /// # Errors
    ///
    /// Returns `CoderError::TypeMismatch` if the stored shape cannot be read
    /// as `T`, or whatever [`ValueCoder::decode`] raised.
    fn decode_value<T: DeserializeOwned + 'static>(
        &self,
        native: NativeValue,
        key: &str,
    ) -> Result<T, CoderError> {
        let found = native.kind();
        if NativeForm::of::<T>().is_some() {
            let native = self.decode_native(native, key)?;
            if native.as_data() == Some(NULL_PAYLOAD) {
                if let Ok(null) = serde_json::from_value(Value::Null) {
                    return Ok(null);
                }
            }
            return from_native(native)
                .map_err(|e| CoderError::mismatch(key, type_name::<T>(), format!("{found} ({e})")));
        }

        let json = self.decode(native, key)?;
        serde_json::from_value(json)
            .map_err(|e| CoderError::mismatch(key, type_name::<T>(), format!("{found} ({e})")))
    }
}

impl<C: ValueCoder + ?Sized> ValueCoderExt for C {}

impl<C: ValueCoder + ?Sized> ValueCoder for Arc<C> {
    fn encode(&self, value: Value, key: &str) -> Result<NativeValue, CoderError> {
        (**self).encode(value, key)
    }

    fn decode(&self, native: NativeValue, key: &str) -> Result<Value, CoderError> {
        (**self).decode(native, key)
    }

    fn encode_bytes(&self, bytes: Vec<u8>, key: &str) -> Result<NativeValue, CoderError> {
        (**self).encode_bytes(bytes, key)
    }

    fn decode_bytes(&self, native: NativeValue, key: &str) -> Result<Vec<u8>, CoderError> {
        (**self).decode_bytes(native, key)
    }

    fn encode_native(&self, native: NativeValue, key: &str) -> Result<NativeValue, CoderError> {
        (**self).encode_native(native, key)
    }

    fn decode_native(&self, native: NativeValue, key: &str) -> Result<NativeValue, CoderError> {
        (**self).decode_native(native, key)
    }
}
