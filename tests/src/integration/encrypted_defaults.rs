//! # Encrypted Defaults Flow
//!
//! Coordinator → DefaultsStore → CryptoValueCoderDecorator → JsonValueCoder →
//! DefaultsDomain file.
//!
//! - Keys under `enc_` are sealed on disk, everything else stays readable
//! - A different key cannot open sealed values; they fall back to the default
//! - Both ciphers work end to end

#[cfg(test)]
mod tests {
    use super::super::{grow_font, Profile};
    use sd_01_value_coding::{CryptoValueCoderDecorator, JsonValueCoder, SharedCoder};
    use sd_02_kv_stores::{DefaultsConfig, DefaultsDomain, DefaultsStore, KeyValueStore, NativeValue};
    use sd_03_coordinator::Coordinator;
    use shared_crypto::Cipher;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn coder(key: [u8; 32], cipher: Cipher) -> SharedCoder {
        let json: SharedCoder = Arc::new(JsonValueCoder);
        let crypto = CryptoValueCoderDecorator::with_key_prefix(json, &key, "enc_").unwrap();
        Arc::new(crypto.with_cipher(cipher))
    }

    fn open(path: &Path, key: [u8; 32], cipher: Cipher) -> (Arc<DefaultsDomain>, Coordinator<Profile>) {
        let domain = DefaultsDomain::open(path, DefaultsConfig::default()).unwrap();
        let store: Arc<dyn KeyValueStore> =
            Arc::new(DefaultsStore::with_coder(Arc::clone(&domain), coder(key, cipher)));
        (domain, Coordinator::new(store).unwrap())
    }

    #[test]
    fn test_sealed_and_plain_fields_share_one_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");

        {
            let (_, profile) = open(&path, [1; 32], Cipher::XChaCha20Poly1305);
            profile.set(&Profile::NAME, "Ada".to_owned());
            profile.set(&Profile::PASSWORD, Some("hunter2".to_owned()));
            profile.set(&Profile::TAGS, vec!["math".to_owned(), "engines".to_owned()]);
            assert!(profile.synchronize());
        }

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Ada"));
        assert!(!text.contains("hunter2"));

        let (domain, profile) = open(&path, [1; 32], Cipher::XChaCha20Poly1305);
        assert!(matches!(domain.get("enc_password"), Some(NativeValue::Data(_))));
        assert_eq!(profile.get(&Profile::PASSWORD), Some("hunter2".to_owned()));
        assert_eq!(profile.get(&Profile::NAME), "Ada");
        assert_eq!(profile.get(&Profile::TAGS), vec!["math", "engines"]);
    }

    #[test]
    fn test_aes_gcm_round_trips_through_the_stack() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");

        {
            let (_, profile) = open(&path, [2; 32], Cipher::Aes256Gcm);
            profile.set(&Profile::PASSWORD, Some("correct horse".to_owned()));
            assert!(profile.synchronize());
        }

        let (_, profile) = open(&path, [2; 32], Cipher::Aes256Gcm);
        assert_eq!(profile.get(&Profile::PASSWORD), Some("correct horse".to_owned()));
    }

    #[test]
    fn test_wrong_key_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");

        {
            let (_, profile) = open(&path, [3; 32], Cipher::XChaCha20Poly1305);
            profile.set(&Profile::PASSWORD, Some("secret".to_owned()));
            profile.set(&Profile::FONT_SIZE, 16);
            assert!(profile.synchronize());
        }

        let (domain, profile) = open(&path, [4; 32], Cipher::XChaCha20Poly1305);
        assert!(profile.has_stored_value(&Profile::PASSWORD));
        assert!(profile.stored_value(&Profile::PASSWORD).is_err());

        assert_eq!(profile.get(&Profile::PASSWORD), None);
        assert!(!domain.contains("enc_password"));
        assert_eq!(profile.get(&Profile::FONT_SIZE), 16);
    }

    #[test]
    fn test_capability_writes_land_in_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");

        {
            let (_, profile) = open(&path, [5; 32], Cipher::XChaCha20Poly1305);
            assert_eq!(grow_font(&profile).unwrap(), 13);
            assert_eq!(grow_font(&profile).unwrap(), 14);
            assert!(profile.synchronize());
        }

        let (domain, profile) = open(&path, [5; 32], Cipher::XChaCha20Poly1305);
        assert_eq!(domain.get("fontSize"), Some(NativeValue::Integer(14)));
        assert_eq!(profile.get(&Profile::FONT_SIZE), 14);
    }
}
