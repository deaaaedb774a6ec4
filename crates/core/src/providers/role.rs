//! Role-based recipient provider.

use async_trait::async_trait;
use masscontact_common::AppResult;
use masscontact_db::repositories::UserRepository;

use crate::models::{ProviderConfig, RecipientSet};
use crate::traits::RecipientProvider;

/// Selects active users holding any of the configured roles.
#[derive(Clone)]
pub struct RoleProvider {
    user_repo: UserRepository,
}

impl RoleProvider {
    /// Provider id used in category bindings.
    pub const ID: &'static str = "role";

    /// Create a new role provider.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl RecipientProvider for RoleProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn recipients(&self, config: &ProviderConfig) -> AppResult<RecipientSet> {
        let ids = self
            .user_repo
            .find_active_ids_by_roles(&config.categories)
            .await?;
        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use masscontact_db::entities::{user, user_role};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_recipients_by_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_role::Model {
                    id: "r1".to_string(),
                    user_id: "u1".to_string(),
                    role: "editor".to_string(),
                }]])
                .append_query_results([[user::Model {
                    id: "u1".to_string(),
                    username: "alice".to_string(),
                    email: "alice@example.com".to_string(),
                    language: "en".to_string(),
                    is_active: true,
                    mass_contact_opt_out: None,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );

        let provider = RoleProvider::new(UserRepository::new(db));
        let result = provider
            .recipients(&ProviderConfig::new(["editor"]))
            .await
            .unwrap();

        assert_eq!(provider.id(), "role");
        assert_eq!(result.into_iter().collect::<Vec<_>>(), vec!["u1"]);
    }
}
