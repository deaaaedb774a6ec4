//! Category store over the category table.

use async_trait::async_trait;
use masscontact_common::{AppError, AppResult};
use masscontact_db::entities::mass_contact_category;
use masscontact_db::repositories::CategoryRepository;

use crate::models::{Category, CategoryId, ProviderBinding};
use crate::traits::CategoryStore;

/// [`CategoryStore`] backed by [`CategoryRepository`].
#[derive(Clone)]
pub struct DbCategoryStore {
    category_repo: CategoryRepository,
}

impl DbCategoryStore {
    /// Create a new category store.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self { category_repo }
    }
}

fn to_category(model: mass_contact_category::Model) -> AppResult<Category> {
    let recipients: Vec<ProviderBinding> = serde_json::from_value(model.recipients)
        .map_err(|e| {
            AppError::Config(format!("Category {} has invalid recipients: {e}", model.id))
        })?;

    Ok(Category {
        id: model.id,
        label: model.label,
        selected: model.selected,
        recipients,
        permission_scope: model.permission_scope,
    })
}

#[async_trait]
impl CategoryStore for DbCategoryStore {
    async fn load_many(&self, ids: &[CategoryId]) -> AppResult<Vec<Category>> {
        self.category_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(to_category)
            .collect()
    }

    async fn list_selectable(&self) -> AppResult<Vec<Category>> {
        self.category_repo
            .find_all()
            .await?
            .into_iter()
            .map(to_category)
            .collect()
    }
}
