//! Archive store over the message table.

use async_trait::async_trait;
use masscontact_common::{AppError, AppResult, IdGenerator};
use masscontact_db::entities::mass_contact_message;
use masscontact_db::repositories::MessageRepository;
use sea_orm::Set;

use crate::models::{Message, MessageId};
use crate::traits::ArchiveStore;

/// [`ArchiveStore`] backed by [`MessageRepository`].
#[derive(Clone)]
pub struct DbArchiveStore {
    message_repo: MessageRepository,
    id_gen: IdGenerator,
}

impl DbArchiveStore {
    /// Create a new archive store.
    #[must_use]
    pub const fn new(message_repo: MessageRepository) -> Self {
        Self {
            message_repo,
            id_gen: IdGenerator::new(),
        }
    }
}

#[async_trait]
impl ArchiveStore for DbArchiveStore {
    async fn save(&self, message: &Message) -> AppResult<MessageId> {
        let model = mass_contact_message::ActiveModel {
            id: Set(self.id_gen.generate()),
            subject: Set(message.subject.clone()),
            body: Set(message.body.value.clone()),
            format: Set(message.body.format.as_str().to_string()),
            categories: Set(serde_json::to_value(&message.categories)?),
            created_at: Set(message.created_at.fixed_offset()),
        };

        let saved = self
            .message_repo
            .create(model)
            .await
            .map_err(|e| AppError::Archive(e.to_string()))?;
        Ok(saved.id)
    }
}
