//! # Shared Defaults Flow
//!
//! Several coordinators over one defaults database, either in one process
//! (a shared `DefaultsDomain`) or in two (separate domains on one file,
//! joined by `reload()`).

#[cfg(test)]
mod tests {
    use super::super::{within, Profile};
    use parking_lot::Mutex;
    use sd_02_kv_stores::{ChangeOrigin, DefaultsConfig, DefaultsDomain, DefaultsStore, KeyValueStore};
    use sd_03_coordinator::{Coordinator, FieldChange};
    use sd_runtime::commands::watch;
    use sd_runtime::{Command, Container, RuntimeConfig};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn coordinator(domain: &Arc<DefaultsDomain>) -> Coordinator<Profile> {
        let store: Arc<dyn KeyValueStore> = Arc::new(DefaultsStore::new(Arc::clone(domain)));
        Coordinator::new(store).unwrap()
    }

    #[test]
    fn test_coordinators_on_one_domain_see_each_other() {
        let domain = DefaultsDomain::in_memory("shared");
        let settings_screen = coordinator(&domain);
        let editor = coordinator(&domain);

        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        let _sub = editor.on_change(move |change: &FieldChange| sink.lock().push(*change));

        assert_eq!(editor.get(&Profile::FONT_SIZE), 12);
        settings_screen.set(&Profile::FONT_SIZE, 15);

        assert_eq!(editor.get(&Profile::FONT_SIZE), 15);
        let changes = changes.lock();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id, "FONT_SIZE");
        assert_eq!(changes[0].origin, ChangeOrigin::External);
    }

    #[test]
    fn test_reload_delivers_other_process_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");

        let ours = DefaultsDomain::open(&path, DefaultsConfig::default()).unwrap();
        let theirs = DefaultsDomain::open(&path, DefaultsConfig::default()).unwrap();
        let profile = coordinator(&ours);
        let other = coordinator(&theirs);

        let sizes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sizes);
        let _sub = profile.subscribe(&Profile::FONT_SIZE, move |size| sink.lock().push(*size));

        other.set(&Profile::FONT_SIZE, 22);
        other.set(&Profile::NAME, "Margaret".to_owned());
        assert!(other.synchronize());

        assert_eq!(profile.get(&Profile::FONT_SIZE), 12);
        assert_eq!(ours.reload().unwrap(), 2);
        assert_eq!(profile.get(&Profile::FONT_SIZE), 22);
        assert_eq!(profile.get(&Profile::NAME), "Margaret");
        assert_eq!(*sizes.lock(), vec![12, 22]);

        other.remove_all_stored_values();
        assert!(other.synchronize());
        assert_eq!(ours.reload().unwrap(), 2);
        assert_eq!(profile.get(&Profile::FONT_SIZE), 12);
        assert_eq!(*sizes.lock(), vec![12, 22, 12]);
    }

    #[tokio::test]
    async fn test_runtime_watch_reports_edits_from_another_process() {
        let dir = TempDir::new().unwrap();
        let config = RuntimeConfig {
            defaults_path: Some(dir.path().join("prefs.json")),
            watch_interval: Duration::from_millis(10),
            ..RuntimeConfig::default()
        };
        let watcher = Container::new(config.clone()).unwrap();
        let editor = Container::new(config).unwrap();

        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let edit = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Command::parse(&["set", "age", "52"])
                .unwrap()
                .execute(&editor)
                .unwrap();
            let seen = Arc::clone(&lines);
            within(async move {
                while seen.lock().is_empty() {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await;
        };

        watch(&watcher, edit, move |line| {
            sink.lock().push(line);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(*lines.lock(), vec!["External: age = 52 (stored)"]);
    }
}
