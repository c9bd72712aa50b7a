//! # Shared Crypto - Symmetric Primitives
//!
//! **Status:** Used by the crypto value coder decorator
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305, AES-256-GCM | Sealing stored values |
//!
//! ## Security Properties
//!
//! - **XChaCha20**: 192-bit nonce, constant-time, side-channel immune
//! - **Sealed payloads**: nonce and tag travel with the ciphertext, so a
//!   payload can be opened with nothing but the key

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use symmetric::{decrypt, encrypt, open, seal, Cipher, Nonce, SecretKey, KEY_LENGTH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
