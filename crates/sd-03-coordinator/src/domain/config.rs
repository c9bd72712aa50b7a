//! # Coordinator Configuration

/// One-shot key migration applied when a coordinator is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMigration {
    /// Values stored under `from + rest` move to the declared key `to + rest`.
    RenamePrefix { from: String, to: String },
}

impl KeyMigration {
    pub fn rename_prefix(from: impl Into<String>, to: impl Into<String>) -> Self {
        KeyMigration::RenamePrefix {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Coordinator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Migration to run before the coordinator is handed out.
    pub key_migration: Option<KeyMigration>,
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_migration(mut self, migration: KeyMigration) -> Self {
        self.key_migration = Some(migration);
        self
    }
}
