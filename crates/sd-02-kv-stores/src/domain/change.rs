//! # Store Changes

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// Made through this store instance.
    Local,
    /// Made by someone else sharing the physical store (another store on
    /// the same domain, another process, another device).
    External,
}

/// A key whose value has just changed.
///
/// Published after the new value is readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
    pub origin: ChangeOrigin,
}

impl StoreChange {
    pub fn local(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            origin: ChangeOrigin::Local,
        }
    }

    pub fn external(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            origin: ChangeOrigin::External,
        }
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        self.origin == ChangeOrigin::External
    }
}
