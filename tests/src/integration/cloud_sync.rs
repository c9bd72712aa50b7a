//! # Cloud Sync Flow
//!
//! Two devices, each a Coordinator over its own UbiquitousStore replica of one
//! CloudKeyValueBackend.
//!
//! 1. Device A writes; the change is pending until `synchronize()`
//! 2. The push reaches device B as an external change
//! 3. B's cached value refreshes and its subscribers fire
//! 4. Offline pushes fail and keep the pending changes

#[cfg(test)]
mod tests {
    use super::super::{eventually, within, Profile};
    use parking_lot::Mutex;
    use sd_01_value_coding::JsonValueCoder;
    use sd_02_kv_stores::{
        ChangeOrigin, CloudKeyValueBackend, CloudSyncConfig, KeyValueStore, UbiquitousStore,
    };
    use sd_03_coordinator::Coordinator;
    use std::sync::Arc;

    struct Device {
        store: Arc<UbiquitousStore>,
        profile: Coordinator<Profile>,
    }

    fn device(backend: &Arc<CloudKeyValueBackend>, config: CloudSyncConfig) -> Device {
        let store =
            UbiquitousStore::connect(Arc::clone(backend), Arc::new(JsonValueCoder), config).unwrap();
        let profile = Coordinator::new(Arc::clone(&store) as Arc<dyn KeyValueStore>).unwrap();
        Device { store, profile }
    }

    #[tokio::test]
    async fn test_write_reaches_other_device_after_synchronize() {
        let backend = CloudKeyValueBackend::new();
        let laptop = device(&backend, CloudSyncConfig::default());
        let phone = device(&backend, CloudSyncConfig::default());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = phone.profile.subscribe(&Profile::NAME, move |name| {
            sink.lock().push(name.clone());
        });

        laptop.profile.set(&Profile::NAME, "Grace".to_owned());
        assert_eq!(laptop.store.pending_keys(), vec!["name"]);
        assert_eq!(phone.profile.get(&Profile::NAME), "Anonymous");

        assert!(laptop.profile.synchronize());
        eventually(|| phone.profile.get(&Profile::NAME) == "Grace").await;
        assert_eq!(*seen.lock(), vec!["Anonymous", "Grace"]);
    }

    #[tokio::test]
    async fn test_remote_changes_are_reported_as_external() {
        let backend = CloudKeyValueBackend::new();
        let laptop = device(&backend, CloudSyncConfig::new().with_sync_on_write(true));
        let phone = device(&backend, CloudSyncConfig::default());

        let mut changes = phone.profile.change_stream();
        laptop.profile.set(&Profile::FONT_SIZE, 18);

        let change = within(changes.recv()).await.unwrap();
        assert_eq!(change.key, "fontSize");
        assert_eq!(change.origin, ChangeOrigin::External);
        assert!(change.is_external());
        assert_eq!(phone.profile.get(&Profile::FONT_SIZE), 18);
    }

    #[tokio::test]
    async fn test_remote_removal_restores_default() {
        let backend = CloudKeyValueBackend::new();
        let laptop = device(&backend, CloudSyncConfig::new().with_sync_on_write(true));
        let phone = device(&backend, CloudSyncConfig::default());

        laptop.profile.set(&Profile::TAGS, vec!["travel".to_owned()]);
        eventually(|| phone.profile.get(&Profile::TAGS) == ["travel"]).await;

        laptop.profile.remove_stored_value(&Profile::TAGS);
        eventually(|| phone.profile.get(&Profile::TAGS).is_empty()).await;
        assert!(!phone.profile.has_stored_value(&Profile::TAGS));
    }

    #[tokio::test]
    async fn test_pending_local_write_wins_over_remote() {
        let backend = CloudKeyValueBackend::new();
        let laptop = device(&backend, CloudSyncConfig::default());
        let phone = device(&backend, CloudSyncConfig::default());

        phone.profile.set(&Profile::NAME, "Phone".to_owned());
        laptop.profile.set(&Profile::NAME, "Laptop".to_owned());
        laptop.profile.set(&Profile::FONT_SIZE, 20);
        assert!(laptop.profile.synchronize());

        eventually(|| phone.profile.get(&Profile::FONT_SIZE) == 20).await;
        assert_eq!(phone.profile.get(&Profile::NAME), "Phone");

        assert!(phone.profile.synchronize());
        eventually(|| laptop.profile.get(&Profile::NAME) == "Phone").await;
    }

    #[tokio::test]
    async fn test_crossing_writes_converge_on_backend_value() {
        let backend = CloudKeyValueBackend::new();
        let laptop = device(&backend, CloudSyncConfig::default());
        let phone = device(&backend, CloudSyncConfig::new().with_sync_on_write(true));

        laptop.profile.set(&Profile::NAME, "A".to_owned());
        phone.profile.set(&Profile::NAME, "B".to_owned());
        assert!(laptop.profile.synchronize());

        eventually(|| laptop.store.synced_through() == 2 && phone.store.synced_through() == 2).await;
        assert_eq!(laptop.profile.get(&Profile::NAME), "A");
        assert_eq!(phone.profile.get(&Profile::NAME), "A");
        assert_eq!(
            backend.value("name"),
            Some(sd_02_kv_stores::NativeValue::String("A".into()))
        );
    }

    #[tokio::test]
    async fn test_offline_synchronize_keeps_pending_changes() {
        let backend = CloudKeyValueBackend::new();
        let laptop = device(&backend, CloudSyncConfig::default());
        let phone = device(&backend, CloudSyncConfig::default());

        backend.set_online(false);
        laptop.profile.set(&Profile::AVATAR, Some(vec![0x89, 0x50, 0x4e, 0x47]));
        assert!(!laptop.profile.synchronize());
        assert_eq!(laptop.store.pending_keys(), vec!["avatar"]);

        backend.set_online(true);
        assert!(laptop.profile.synchronize());
        assert!(laptop.store.pending_keys().is_empty());
        eventually(|| phone.profile.get(&Profile::AVATAR).is_some()).await;
        assert_eq!(phone.profile.get(&Profile::AVATAR), Some(vec![0x89, 0x50, 0x4e, 0x47]));
    }

    #[tokio::test]
    async fn test_late_device_starts_from_backend_snapshot() {
        let backend = CloudKeyValueBackend::new();
        let laptop = device(&backend, CloudSyncConfig::new().with_sync_on_write(true));
        laptop.profile.set(&Profile::NAME, "Linus".to_owned());

        let tablet = device(&backend, CloudSyncConfig::default());
        assert_eq!(tablet.profile.get(&Profile::NAME), "Linus");
        assert!(tablet.profile.has_stored_value(&Profile::NAME));
    }
}
