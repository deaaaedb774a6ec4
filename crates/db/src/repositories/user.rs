//! User repository.

use std::sync::Arc;

use crate::entities::{RecipientListMember, User, UserRole, recipient_list_member, user, user_role};
use masscontact_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// User repository for recipient lookups.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of active users whose opt-out attribute holds any non-default value.
    pub async fn find_active_ids_with_any_opt_out(&self) -> AppResult<Vec<String>> {
        let users = User::find()
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::MassContactOptOut.is_not_null())
            .filter(user::Column::MassContactOptOut.ne(user::OPT_OUT_NONE))
            .filter(user::Column::MassContactOptOut.ne(""))
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().map(|u| u.id).collect())
    }

    /// IDs of active users whose opt-out attribute equals one of `values`.
    pub async fn find_active_ids_with_opt_out_in(&self, values: &[String]) -> AppResult<Vec<String>> {
        if values.is_empty() {
            return Ok(vec![]);
        }

        let users = User::find()
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::MassContactOptOut.is_in(values.to_vec()))
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().map(|u| u.id).collect())
    }

    /// IDs of active users holding any of the given roles.
    pub async fn find_active_ids_by_roles(&self, roles: &[String]) -> AppResult<Vec<String>> {
        if roles.is_empty() {
            return Ok(vec![]);
        }

        let assignments = UserRole::find()
            .filter(user_role::Column::Role.is_in(roles.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user_ids: Vec<String> = assignments.into_iter().map(|a| a.user_id).collect();
        self.active_ids_among(user_ids).await
    }

    /// IDs of active users subscribed to any of the given lists.
    pub async fn find_active_ids_in_lists(&self, list_ids: &[String]) -> AppResult<Vec<String>> {
        if list_ids.is_empty() {
            return Ok(vec![]);
        }

        let members = RecipientListMember::find()
            .filter(recipient_list_member::Column::ListId.is_in(list_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user_ids: Vec<String> = members.into_iter().map(|m| m.user_id).collect();
        self.active_ids_among(user_ids).await
    }

    async fn active_ids_among(&self, mut user_ids: Vec<String>) -> AppResult<Vec<String>> {
        user_ids.sort();
        user_ids.dedup();

        Ok(self
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .filter(|u| u.is_active)
            .map(|u| u.id)
            .collect())
    }
}
