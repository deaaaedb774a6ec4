//! Recipient directory over the user table.

use async_trait::async_trait;
use masscontact_common::AppResult;
use masscontact_db::repositories::UserRepository;

use crate::models::{OptOutCriteria, RecipientId, RecipientRecord, RecipientSet};
use crate::traits::RecipientDirectory;

/// [`RecipientDirectory`] backed by [`UserRepository`].
#[derive(Clone)]
pub struct DbRecipientDirectory {
    user_repo: UserRepository,
}

impl DbRecipientDirectory {
    /// Create a new directory.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }
}

#[async_trait]
impl RecipientDirectory for DbRecipientDirectory {
    async fn load(&self, id: &RecipientId) -> AppResult<Option<RecipientRecord>> {
        Ok(self.user_repo.find_by_id(id).await?.map(|user| RecipientRecord {
            email: user.email,
            language: user.language,
            active: user.is_active,
        }))
    }

    async fn find_opted_out(&self, criteria: &OptOutCriteria) -> AppResult<RecipientSet> {
        let ids = match criteria {
            OptOutCriteria::AnyValue => self.user_repo.find_active_ids_with_any_opt_out().await?,
            OptOutCriteria::OneOf(values) => {
                let values: Vec<String> = values.iter().cloned().collect();
                self.user_repo
                    .find_active_ids_with_opt_out_in(&values)
                    .await?
            }
        };
        Ok(ids.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use masscontact_db::entities::user;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, is_active: bool, opt_out: Option<&str>) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            email: format!("{id}@example.com"),
            language: "de".to_string(),
            is_active,
            mass_contact_opt_out: opt_out.map(str::to_string),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_load_maps_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1", false, None)]])
                .into_connection(),
        );
        let directory = DbRecipientDirectory::new(UserRepository::new(db));

        let record = directory.load(&"u1".to_string()).await.unwrap().unwrap();

        assert_eq!(record.email, "u1@example.com");
        assert_eq!(record.language, "de");
        assert!(!record.active);
    }

    #[tokio::test]
    async fn test_find_opted_out_by_values() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_user("u1", true, Some("1")),
                    create_test_user("u2", true, Some("news")),
                ]])
                .into_connection(),
        );
        let directory = DbRecipientDirectory::new(UserRepository::new(db));
        let criteria = OptOutCriteria::OneOf(["1".to_string(), "news".to_string()].into());

        let ids = directory.find_opted_out(&criteria).await.unwrap();

        assert_eq!(ids.len(), 2);
    }
}
