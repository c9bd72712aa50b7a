//! # Symmetric Encryption
//!
//! Provides XChaCha20-Poly1305 (default) and AES-256-GCM encryption.
//!
//! ## Security Properties
//!
//! - **XChaCha20-Poly1305**: 192-bit nonce, constant-time ARX design
//! - **AES-GCM**: Use only with AES-NI hardware acceleration
//!
//! ## Sealed Payload Layout
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┐
//! │ nonce        │ ciphertext ‖ 16-byte tag      │
//! │ 24 B / 12 B  │                              │
//! └──────────────┴──────────────────────────────┘
//! ```

use crate::CryptoError;
use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use std::fmt;
use zeroize::Zeroize;

/// Required symmetric key length in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Authentication tag length shared by both ciphers.
const TAG_LENGTH: usize = 16;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; KEY_LENGTH]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, rejecting anything that is not exactly 256 bits.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if `bytes` is not 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Nonce for encryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    /// Create from bytes, checking the length against the cipher.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidNonceLength` on a length mismatch.
    pub fn from_slice(cipher: Cipher, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != cipher.nonce_length() {
            return Err(CryptoError::InvalidNonceLength {
                expected: cipher.nonce_length(),
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Generate random nonce (safe with XChaCha20's 192-bit nonce).
    pub fn generate(cipher: Cipher) -> Self {
        let mut bytes = vec![0u8; cipher.nonce_length()];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Cipher selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cipher {
    /// XChaCha20-Poly1305 (default, side-channel immune)
    #[default]
    XChaCha20Poly1305,
    /// AES-256-GCM (use with AES-NI only)
    Aes256Gcm,
}

impl Cipher {
    /// Nonce length in bytes.
    pub const fn nonce_length(self) -> usize {
        match self {
            Cipher::XChaCha20Poly1305 => 24,
            Cipher::Aes256Gcm => 12,
        }
    }

    /// Smallest sealed payload this cipher can open (empty plaintext).
    pub const fn min_sealed_length(self) -> usize {
        self.nonce_length() + TAG_LENGTH
    }
}

/// Encrypt plaintext with the selected cipher.
///
/// Returns (ciphertext, nonce).
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn encrypt(
    cipher: Cipher,
    key: &SecretKey,
    plaintext: &[u8],
) -> Result<(Vec<u8>, Nonce), CryptoError> {
    let nonce = Nonce::generate(cipher);

    let ciphertext = match cipher {
        Cipher::XChaCha20Poly1305 => XChaCha20Poly1305::new(key.as_bytes().into())
            .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext),
        Cipher::Aes256Gcm => Aes256Gcm::new(key.as_bytes().into())
            .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), plaintext),
    }
    .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext with the selected cipher.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if decryption fails.
pub fn decrypt(
    cipher: Cipher,
    key: &SecretKey,
    ciphertext: &[u8],
    nonce: &Nonce,
) -> Result<Vec<u8>, CryptoError> {
    match cipher {
        Cipher::XChaCha20Poly1305 => XChaCha20Poly1305::new(key.as_bytes().into())
            .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext),
        Cipher::Aes256Gcm => Aes256Gcm::new(key.as_bytes().into())
            .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), ciphertext),
    }
    .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Encrypt and bundle nonce and ciphertext into one self-describing payload.
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn seal(cipher: Cipher, key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let (ciphertext, nonce) = encrypt(cipher, key, plaintext)?;

    let mut sealed = Vec::with_capacity(nonce.as_bytes().len() + ciphertext.len());
    sealed.extend_from_slice(nonce.as_bytes());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a payload produced by [`seal`].
///
/// # Errors
///
/// Returns `CryptoError::PayloadTooShort` for truncated input and
/// `CryptoError::DecryptionFailed` for a wrong key or tampered payload.
pub fn open(cipher: Cipher, key: &SecretKey, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < cipher.min_sealed_length() {
        return Err(CryptoError::PayloadTooShort {
            length: sealed.len(),
            minimum: cipher.min_sealed_length(),
        });
    }

    let (nonce, ciphertext) = sealed.split_at(cipher.nonce_length());
    let nonce = Nonce::from_slice(cipher, nonce)?;
    decrypt(cipher, key, ciphertext, &nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = SecretKey::generate();
        let plaintext = b"Hello, stored defaults!";

        let (ciphertext, nonce) = encrypt(Cipher::default(), &key, plaintext).unwrap();
        let decrypted = decrypt(Cipher::default(), &key, &ciphertext, &nonce).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_seal_open_both_ciphers() {
        let key = SecretKey::generate();
        for cipher in [Cipher::XChaCha20Poly1305, Cipher::Aes256Gcm] {
            let sealed = seal(cipher, &key, b"greeting").unwrap();
            assert_eq!(sealed.len(), cipher.min_sealed_length() + b"greeting".len());
            assert_eq!(open(cipher, &key, &sealed).unwrap(), b"greeting");
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = SecretKey::generate();
        let key2 = SecretKey::generate();

        let sealed = seal(Cipher::default(), &key1, b"Secret message").unwrap();
        let result = open(Cipher::default(), &key2, &sealed);

        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let key = SecretKey::generate();

        let mut sealed = seal(Cipher::default(), &key, b"Secret message").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF; // Tamper with the tag

        assert!(open(Cipher::default(), &key, &sealed).is_err());
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let key = SecretKey::generate();
        let result = open(Cipher::Aes256Gcm, &key, &[0u8; 10]);

        assert_eq!(
            result,
            Err(CryptoError::PayloadTooShort {
                length: 10,
                minimum: 28
            })
        );
    }

    #[test]
    fn test_key_length_enforced() {
        assert!(SecretKey::from_slice(&[7u8; 32]).is_ok());

        let err = SecretKey::from_slice(b"too short").unwrap_err();
        assert_eq!(
            err,
            CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 9
            }
        );
    }

    #[test]
    fn test_key_from_hex() {
        let bytes = hex::decode("41".repeat(32)).unwrap();
        let key = SecretKey::from_slice(&bytes).unwrap();
        assert_eq!(key.as_bytes(), &[0x41; 32]);
        assert_eq!(format!("{key:?}"), "SecretKey(..)");
    }

    #[test]
    fn test_nonce_uniqueness() {
        let n1 = Nonce::generate(Cipher::default());
        let n2 = Nonce::generate(Cipher::default());
        assert_ne!(n1.as_bytes(), n2.as_bytes());
    }
}
