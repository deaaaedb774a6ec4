//! Mass contact category repository.

use std::sync::Arc;

use crate::entities::{MassContactCategory, mass_contact_category};
use masscontact_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find categories by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<mass_contact_category::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        MassContactCategory::find()
            .filter(mass_contact_category::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all categories ordered by label.
    pub async fn find_all(&self) -> AppResult<Vec<mass_contact_category::Model>> {
        MassContactCategory::find()
            .order_by_asc(mass_contact_category::Column::Label)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn create_test_category(id: &str, label: &str) -> mass_contact_category::Model {
        mass_contact_category::Model {
            id: id.to_string(),
            label: label.to_string(),
            selected: false,
            permission_scope: format!("send to {id}"),
            recipients: json!([{"provider": "role", "categories": ["editor"]}]),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let editors = create_test_category("editors", "Editors");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[editors.clone()]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.find_by_ids(&["editors".to_string()]).await.unwrap();

        assert_eq!(result, vec![editors]);
    }

    #[tokio::test]
    async fn test_find_by_ids_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = CategoryRepository::new(db);

        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }
}
