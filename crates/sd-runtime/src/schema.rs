//! # Sample Schema
//!
//! `Preferences` provides two capabilities: [`font`] styling and a
//! [`greeting`] with its last update time. Code written against a capability
//! works with any schema that maps it.

use chrono::{DateTime, Utc};
use sd_03_coordinator::{stored_schema, CapabilityField, Coordinator, CoordinatorError, Schema};

/// Font styling fields.
pub mod font {
    use sd_03_coordinator::CapabilityField;

    pub const IS_BOLD: CapabilityField<bool> = CapabilityField::new("FontSettings.isBold");
    pub const IS_ITALIC: CapabilityField<bool> = CapabilityField::new("FontSettings.isItalic");
    pub const IS_UNDERLINE: CapabilityField<bool> = CapabilityField::new("FontSettings.isUnderline");
    pub const IS_STRIKETHROUGH: CapabilityField<bool> =
        CapabilityField::new("FontSettings.isStrikethrough");
}

/// A greeting and when it last changed.
pub mod greeting {
    use chrono::{DateTime, Utc};
    use sd_03_coordinator::CapabilityField;

    pub const GREETING: CapabilityField<String> = CapabilityField::new("GreetingStore.greeting");
    pub const UPDATED_DATE: CapabilityField<Option<DateTime<Utc>>> =
        CapabilityField::new("GreetingStore.updatedDate");
}

stored_schema! {
    /// Application preferences.
    pub struct Preferences {
        IS_BOLD: bool = "isBold" => false,
        IS_ITALIC: bool = "isItalic" => false,
        IS_UNDERLINE: bool = "isUnderline" => false,
        IS_STRIKETHROUGH: bool = "isStrikethrough" => false,
        AGE: i64 = "age" => 30,
        GREETING: String = "greeting" => "Hello".to_owned(),
        UPDATED_DATE: Option<DateTime<Utc>> = "updatedDate" => None,
        /// Encrypted when a key is configured.
        API_TOKEN: Option<String> = "enc_apiToken" => None,
    }
    capabilities {
        font::IS_BOLD => IS_BOLD,
        font::IS_ITALIC => IS_ITALIC,
        font::IS_UNDERLINE => IS_UNDERLINE,
        font::IS_STRIKETHROUGH => IS_STRIKETHROUGH,
        greeting::GREETING => GREETING,
        greeting::UPDATED_DATE => UPDATED_DATE,
    }
}

/// Flip one font style through the capability table.
///
/// # Errors
///
/// Fails if the schema does not provide the style.
pub fn toggle_style<S: Schema>(
    coordinator: &Coordinator<S>,
    style: &CapabilityField<bool>,
) -> Result<bool, CoordinatorError> {
    let toggled = !coordinator.get_capability(style)?;
    coordinator.set_capability(style, toggled)?;
    Ok(toggled)
}

/// Replace the greeting and stamp the update time.
///
/// # Errors
///
/// Fails if the schema does not provide the greeting capability.
pub fn update_greeting<S: Schema>(
    coordinator: &Coordinator<S>,
    text: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<(), CoordinatorError> {
    coordinator.set_capability(&greeting::GREETING, text.into())?;
    coordinator.set_capability(&greeting::UPDATED_DATE, Some(now))
}
