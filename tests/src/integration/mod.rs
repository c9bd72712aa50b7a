//! # Integration Tests
//!
//! Every flow goes through a [`Coordinator`] over a real store stack.

pub mod cloud_sync;
pub mod concurrency;
pub mod encrypted_defaults;
pub mod file_reload;

use sd_03_coordinator::{stored_schema, Coordinator, CoordinatorError, Schema};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// A note-taking app's settings capability.
pub mod notes {
    use sd_03_coordinator::CapabilityField;

    pub const FONT_SIZE: CapabilityField<i64> = CapabilityField::new("NoteSettings.fontSize");
}

stored_schema! {
    /// Schema shared by the integration flows.
    pub struct Profile {
        NAME: String = "name" => "Anonymous".to_owned(),
        FONT_SIZE: i64 = "fontSize" => 12,
        TAGS: Vec<String> = "tags" => Vec::new(),
        AVATAR: Option<Vec<u8>> = "avatar" => None,
        PASSWORD: Option<String> = "enc_password" => None,
    }
    capabilities {
        notes::FONT_SIZE => FONT_SIZE,
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let reached = timeout(Duration::from_secs(2), async {
        while !check() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "condition not reached in time");
}

/// Bump the note font size through the capability table.
pub fn grow_font<S: Schema>(coordinator: &Coordinator<S>) -> Result<i64, CoordinatorError> {
    let size = coordinator.get_capability(&notes::FONT_SIZE)? + 1;
    coordinator.set_capability(&notes::FONT_SIZE, size)?;
    Ok(size)
}

/// Run `future` with a two second ceiling.
pub async fn within<F: Future>(future: F) -> F::Output {
    match timeout(Duration::from_secs(2), future).await {
        Ok(output) => output,
        Err(_) => panic!("timed out"),
    }
}
