//! Recipient resolution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use masscontact_common::{AppError, AppResult};
use tracing::{debug, info};

use crate::models::{Category, ProviderBinding, RecipientSet};
use crate::services::opt_out::OptOutFilter;
use crate::traits::RecipientProvider;

/// Registered recipient providers, keyed by provider id.
///
/// Built once at start-up and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn RecipientProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own id, replacing any previous one.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn RecipientProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Register a provider under its own id, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn RecipientProvider>) {
        self.providers.insert(provider.id().to_string(), provider);
    }

    /// Look up a provider.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn RecipientProvider>> {
        self.providers.get(id)
    }

    /// Registered provider ids.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

/// Computes the deduplicated, opt-out filtered recipients of categories.
#[derive(Clone)]
pub struct RecipientResolver {
    registry: Arc<ProviderRegistry>,
    opt_out: OptOutFilter,
}

impl RecipientResolver {
    /// Create a new resolver.
    #[must_use]
    pub const fn new(registry: Arc<ProviderRegistry>, opt_out: OptOutFilter) -> Self {
        Self { registry, opt_out }
    }

    /// Resolve the recipients of `categories`.
    ///
    /// A binding naming an unregistered provider is a configuration error.
    pub async fn resolve(&self, categories: &[Category]) -> AppResult<RecipientSet> {
        if categories.is_empty() {
            return Ok(RecipientSet::new());
        }

        let mut seen_categories = HashSet::new();
        let mut seen_bindings: HashSet<&ProviderBinding> = HashSet::new();
        let mut recipients = RecipientSet::new();

        for category in categories {
            if !seen_categories.insert(category.id.as_str()) {
                continue;
            }

            for binding in &category.recipients {
                if !seen_bindings.insert(binding) {
                    continue;
                }

                let provider = self.registry.get(&binding.provider).ok_or_else(|| {
                    AppError::Config(format!(
                        "Category {} references unknown recipient provider {}",
                        category.id, binding.provider
                    ))
                })?;

                let found = provider.recipients(&binding.config).await?;
                debug!(
                    category = %category.id,
                    provider = %binding.provider,
                    count = found.len(),
                    "Provider returned recipients"
                );
                recipients.extend(found);
            }
        }

        let opted_out = self.opt_out.opted_out(categories).await?;
        let total = recipients.len();
        recipients.retain(|id| !opted_out.contains(id));

        info!(
            categories = categories.len(),
            matched = total,
            opted_out = total - recipients.len(),
            recipients = recipients.len(),
            "Resolved recipients"
        );

        Ok(recipients)
    }
}
