//! Per-message delivery configuration.

use masscontact_common::MassContactSettings;
use serde::{Deserialize, Serialize};

/// Delivery settings resolved once per message.
///
/// Every batch derived from a message carries an identical copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfiguration {
    /// Send one BCC mail per batch instead of one mail per recipient.
    pub use_bcc: bool,
    /// Sender display name.
    pub sender_name: String,
    /// Sender address.
    pub sender_email: String,
    /// Archive a copy of the message.
    pub create_archive_copy: bool,
}

impl DeliveryConfiguration {
    /// The `From` value, `Name <address>` when a name is set.
    #[must_use]
    pub fn sender(&self) -> String {
        if self.sender_name.is_empty() {
            self.sender_email.clone()
        } else {
            format!("{} <{}>", self.sender_name, self.sender_email)
        }
    }
}

/// Stored site-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDefaults {
    /// Default for `use_bcc`.
    pub use_bcc: bool,
    /// Default sender name.
    pub sender_name: String,
    /// Default sender address.
    pub sender_email: String,
    /// Default for `create_archive_copy`.
    pub create_archive_copy: bool,
}

impl From<&MassContactSettings> for DeliveryDefaults {
    fn from(settings: &MassContactSettings) -> Self {
        Self {
            use_bcc: settings.use_bcc,
            sender_name: settings.default_sender_name.clone(),
            sender_email: settings.default_sender_email.clone(),
            create_archive_copy: settings.create_archive_copy,
        }
    }
}

/// Caller-supplied settings; anything left unset falls back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOverrides {
    /// Override for `use_bcc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_bcc: Option<bool>,
    /// Override for the sender name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Override for the sender address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    /// Override for `create_archive_copy`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_archive_copy: Option<bool>,
}

/// Pins every field, so later defaults no longer apply.
impl From<&DeliveryConfiguration> for DeliveryOverrides {
    fn from(configuration: &DeliveryConfiguration) -> Self {
        Self {
            use_bcc: Some(configuration.use_bcc),
            sender_name: Some(configuration.sender_name.clone()),
            sender_email: Some(configuration.sender_email.clone()),
            create_archive_copy: Some(configuration.create_archive_copy),
        }
    }
}

impl DeliveryOverrides {
    /// Fill unset fields from `defaults`.
    #[must_use]
    pub fn resolve(&self, defaults: &DeliveryDefaults) -> DeliveryConfiguration {
        DeliveryConfiguration {
            use_bcc: self.use_bcc.unwrap_or(defaults.use_bcc),
            sender_name: self
                .sender_name
                .clone()
                .unwrap_or_else(|| defaults.sender_name.clone()),
            sender_email: self
                .sender_email
                .clone()
                .unwrap_or_else(|| defaults.sender_email.clone()),
            create_archive_copy: self
                .create_archive_copy
                .unwrap_or(defaults.create_archive_copy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> DeliveryDefaults {
        DeliveryDefaults {
            use_bcc: true,
            sender_name: "Site".to_string(),
            sender_email: "site@example.com".to_string(),
            create_archive_copy: true,
        }
    }

    #[test]
    fn test_resolve_fills_missing_fields() {
        let overrides = DeliveryOverrides {
            use_bcc: Some(false),
            sender_name: Some("Editors".to_string()),
            ..Default::default()
        };

        let config = overrides.resolve(&defaults());

        assert!(!config.use_bcc);
        assert_eq!(config.sender_name, "Editors");
        assert_eq!(config.sender_email, "site@example.com");
        assert!(config.create_archive_copy);
    }

    #[test]
    fn test_sender_formatting() {
        let mut config = DeliveryOverrides::default().resolve(&defaults());
        assert_eq!(config.sender(), "Site <site@example.com>");

        config.sender_name.clear();
        assert_eq!(config.sender(), "site@example.com");
    }
}
