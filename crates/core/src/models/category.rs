//! Recipient categories.

use serde::{Deserialize, Serialize};

/// Category identifier.
pub type CategoryId = String;

/// Provider-specific selection for a category.
///
/// `categories` holds the provider's own sub-category selectors, e.g. role
/// names for the role provider or list ids for the list provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Sub-category selectors.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ProviderConfig {
    /// Create a config selecting the given sub-categories.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

/// A (provider id, config) pair describing part of a category's audience.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderBinding {
    /// Registered provider id, e.g. `role`.
    pub provider: String,
    /// Selection handed to the provider.
    #[serde(flatten)]
    pub config: ProviderConfig,
}

impl ProviderBinding {
    /// Create a new binding.
    pub fn new(provider: impl Into<String>, config: ProviderConfig) -> Self {
        Self {
            provider: provider.into(),
            config,
        }
    }
}

/// A named, admin-defined group of recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id.
    pub id: CategoryId,
    /// Human readable label.
    pub label: String,
    /// Pre-selected on the compose form.
    #[serde(default)]
    pub selected: bool,
    /// Ordered provider bindings.
    #[serde(default)]
    pub recipients: Vec<ProviderBinding>,
    /// Permission a sender needs to target this category.
    #[serde(default)]
    pub permission_scope: String,
}

impl Category {
    /// Create a category with no provider bindings.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            permission_scope: format!("mass contact send to users in the {id} category"),
            id,
            label: label.into(),
            selected: false,
            recipients: Vec::new(),
        }
    }

    /// Add a provider binding.
    #[must_use]
    pub fn with_binding(mut self, provider: impl Into<String>, config: ProviderConfig) -> Self {
        self.recipients.push(ProviderBinding::new(provider, config));
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binding_json_shape() {
        let bindings: Vec<ProviderBinding> = serde_json::from_value(json!([
            {"provider": "role", "categories": ["editor", "admin"]},
            {"provider": "list"}
        ]))
        .unwrap();

        assert_eq!(bindings[0].provider, "role");
        assert_eq!(bindings[0].config, ProviderConfig::new(["editor", "admin"]));
        assert!(bindings[1].config.categories.is_empty());
    }
}
