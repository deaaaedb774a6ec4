//! Archived message repository.

use std::sync::Arc;

use crate::entities::mass_contact_message;
use masscontact_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection};

/// Message archive repository.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Archive a message.
    pub async fn create(
        &self,
        model: mass_contact_message::ActiveModel,
    ) -> AppResult<mass_contact_message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
