//! Queue-backed message delivery.
//!
//! Implements the core [`MessageQueue`] trait so the submission service can
//! hand messages to the background pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use masscontact_common::AppResult;
use masscontact_core::models::{Batch, DeliveryConfiguration, DeliveryOverrides, Message};
use masscontact_core::traits::MessageQueue;

use crate::backend::QueueBackend;
use crate::jobs::{ResolveMessageJob, SendBatchJob};

/// The two stages of the delivery pipeline.
#[derive(Clone)]
pub struct DeliveryQueue {
    messages: Arc<dyn QueueBackend<ResolveMessageJob>>,
    batches: Arc<dyn QueueBackend<SendBatchJob>>,
}

impl DeliveryQueue {
    /// Create a delivery queue over a message queue and a batch queue.
    #[must_use]
    pub fn new(
        messages: Arc<dyn QueueBackend<ResolveMessageJob>>,
        batches: Arc<dyn QueueBackend<SendBatchJob>>,
    ) -> Self {
        Self { messages, batches }
    }

    /// Queue a whole message for later resolution and fan-out.
    pub async fn enqueue_message(
        &self,
        message: Message,
        configuration: DeliveryOverrides,
    ) -> AppResult<()> {
        self.messages
            .enqueue(ResolveMessageJob::new(message, configuration))
            .await?;

        tracing::debug!("Queued message for fan-out");
        Ok(())
    }

    /// Queue one batch for sending.
    pub async fn enqueue_batch(
        &self,
        message: Message,
        configuration: DeliveryConfiguration,
        batch: Batch,
    ) -> AppResult<()> {
        let batch_size = batch.len();
        self.batches
            .enqueue(SendBatchJob::new(message, configuration, batch))
            .await?;

        tracing::debug!(batch_size, "Queued batch");
        Ok(())
    }

    /// The stage 1 queue.
    #[must_use]
    pub fn messages(&self) -> &Arc<dyn QueueBackend<ResolveMessageJob>> {
        &self.messages
    }

    /// The stage 2 queue.
    #[must_use]
    pub fn batches(&self) -> &Arc<dyn QueueBackend<SendBatchJob>> {
        &self.batches
    }
}

#[async_trait]
impl MessageQueue for DeliveryQueue {
    async fn enqueue_message(
        &self,
        message: Message,
        configuration: DeliveryOverrides,
    ) -> AppResult<()> {
        Self::enqueue_message(self, message, configuration).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryQueue;
    use masscontact_core::models::MessageBody;

    fn message() -> Message {
        Message::new("Notice", MessageBody::plain("Body"), vec!["staff".to_string()])
    }

    #[tokio::test]
    async fn test_message_and_batch_go_to_separate_queues() {
        let messages = Arc::new(MemoryQueue::<ResolveMessageJob>::new());
        let batches = Arc::new(MemoryQueue::<SendBatchJob>::new());
        let queue = DeliveryQueue::new(messages.clone(), batches.clone());

        let overrides = DeliveryOverrides {
            use_bcc: Some(false),
            ..Default::default()
        };
        let as_trait: &dyn MessageQueue = &queue;
        as_trait
            .enqueue_message(message(), overrides.clone())
            .await
            .unwrap();

        assert_eq!(messages.len().await.unwrap(), 1);
        assert_eq!(batches.len().await.unwrap(), 0);

        let claimed = messages.claim().await.unwrap().unwrap();
        assert_eq!(claimed.job().configuration, overrides);
        assert_eq!(claimed.job().message.subject, "Notice");

        let configuration = DeliveryConfiguration {
            use_bcc: true,
            sender_name: String::new(),
            sender_email: "site@example.com".to_string(),
            create_archive_copy: false,
        };
        queue
            .enqueue_batch(
                message(),
                configuration.clone(),
                Batch::from(vec!["a".to_string(), "b".to_string()]),
            )
            .await
            .unwrap();

        let claimed = queue.batches().claim().await.unwrap().unwrap();
        assert_eq!(claimed.job().batch.len(), 2);
        assert_eq!(claimed.job().configuration, configuration);
    }
}
