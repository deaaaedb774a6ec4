//! Mailing list recipient provider.

use async_trait::async_trait;
use masscontact_common::AppResult;
use masscontact_db::repositories::UserRepository;

use crate::models::{ProviderConfig, RecipientSet};
use crate::traits::RecipientProvider;

/// Selects active users subscribed to any of the configured lists.
#[derive(Clone)]
pub struct ListProvider {
    user_repo: UserRepository,
}

impl ListProvider {
    /// Provider id used in category bindings.
    pub const ID: &'static str = "list";

    /// Create a new list provider.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl RecipientProvider for ListProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn recipients(&self, config: &ProviderConfig) -> AppResult<RecipientSet> {
        let ids = self
            .user_repo
            .find_active_ids_in_lists(&config.categories)
            .await?;
        Ok(ids.into_iter().collect())
    }
}
