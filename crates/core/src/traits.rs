//! Collaborator traits.
//!
//! The pipeline services only talk to the outside world through these
//! traits. Database-backed implementations live in [`crate::adapters`] and
//! [`crate::providers`]; the queue crate implements [`MessageQueue`].

use async_trait::async_trait;
use masscontact_common::AppResult;

use crate::models::{
    Category, CategoryId, DeliveryOverrides, Message, MessageId, OptOutCriteria, OutgoingMail,
    ProviderConfig, RecipientId, RecipientRecord, RecipientSet,
};

/// Computes the recipients matching a provider-specific selection.
#[async_trait]
pub trait RecipientProvider: Send + Sync {
    /// Provider id referenced by category bindings.
    fn id(&self) -> &str;

    /// Recipients matching `config`. An empty set is not an error.
    async fn recipients(&self, config: &ProviderConfig) -> AppResult<RecipientSet>;
}

/// Read-only access to recipient accounts.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Load a recipient; `None` if the account no longer exists.
    async fn load(&self, id: &RecipientId) -> AppResult<Option<RecipientRecord>>;

    /// Active recipients whose opt-out attribute satisfies `criteria`.
    async fn find_opted_out(&self, criteria: &OptOutCriteria) -> AppResult<RecipientSet>;
}

/// Sends a single rendered mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send the mail.
    async fn send(&self, mail: OutgoingMail) -> AppResult<()>;
}

/// Persists archive copies of sent messages.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Save a copy and return its id.
    async fn save(&self, message: &Message) -> AppResult<MessageId>;
}

/// Read-only access to categories.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Load the given categories. Unknown ids are omitted.
    async fn load_many(&self, ids: &[CategoryId]) -> AppResult<Vec<Category>>;

    /// All categories a sender may choose from, ordered by label.
    async fn list_selectable(&self) -> AppResult<Vec<Category>>;
}

/// Hands whole messages to the background pipeline.
///
/// This allows the submission service to queue work without depending on the
/// queue implementation.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Queue a message for later resolution and fan-out.
    async fn enqueue_message(
        &self,
        message: Message,
        configuration: DeliveryOverrides,
    ) -> AppResult<()>;
}
