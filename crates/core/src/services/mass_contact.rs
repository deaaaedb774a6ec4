//! Mass contact submission service.

use std::collections::BTreeSet;
use std::sync::Arc;

use masscontact_common::{AppError, AppResult, MassContactSettings};
use tracing::{error, info, warn};

use crate::models::{
    Category, CategoryId, DeliveryDefaults, DeliveryOverrides, Message, MessageBody, MessageId,
};
use crate::services::batch::partition;
use crate::services::dispatcher::{DispatchReport, MessageDispatcher};
use crate::services::resolver::RecipientResolver;
use crate::traits::{ArchiveStore, CategoryStore, MessageQueue};

/// Validation message for a selection that resolves to nobody.
pub const NO_RECIPIENTS: &str = "The selected categories have no recipients.";

/// A message composed by a sender.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Subject line.
    pub subject: String,
    /// Body.
    pub body: MessageBody,
    /// Target category ids.
    pub categories: Vec<CategoryId>,
    /// Per-message settings; unset fields use the site defaults.
    pub overrides: DeliveryOverrides,
}

/// What happened to the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Handed to the background queue.
    Queued,
    /// Delivered immediately.
    Sent {
        /// Totals over every batch that completed.
        report: DispatchReport,
        /// Batches that failed as a whole.
        failed_batches: usize,
    },
}

/// What happened to the archive copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// No copy was requested.
    NotRequested,
    /// The queue worker archives the message after fan-out.
    Deferred,
    /// Archived under this id.
    Archived(MessageId),
    /// Archiving failed; delivery is unaffected.
    Failed(String),
}

/// Result of a submission.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    /// The submitted message, carrying its id if archived.
    pub message: Message,
    /// Number of resolved recipients.
    pub recipients: usize,
    /// Number of batches the recipients were split into.
    pub batches: usize,
    /// Delivery outcome.
    pub outcome: SubmissionOutcome,
    /// Archive outcome.
    pub archive: ArchiveOutcome,
}

/// Validates a message, resolves its recipients and sends or queues it.
#[derive(Clone)]
pub struct MassContactService {
    categories: Arc<dyn CategoryStore>,
    resolver: RecipientResolver,
    dispatcher: MessageDispatcher,
    archive: Arc<dyn ArchiveStore>,
    queue: Option<Arc<dyn MessageQueue>>,
    defaults: DeliveryDefaults,
    batch_size: usize,
    send_with_queue: bool,
}

impl MassContactService {
    /// Create a new submission service.
    pub fn new(
        settings: &MassContactSettings,
        categories: Arc<dyn CategoryStore>,
        resolver: RecipientResolver,
        dispatcher: MessageDispatcher,
        archive: Arc<dyn ArchiveStore>,
    ) -> Self {
        Self {
            categories,
            resolver,
            dispatcher,
            archive,
            queue: None,
            defaults: DeliveryDefaults::from(settings),
            batch_size: settings.batch_size,
            send_with_queue: settings.send_with_queue,
        }
    }

    /// Set the queue used when sending with the queue is enabled.
    #[must_use]
    pub fn with_queue(mut self, queue: Arc<dyn MessageQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Categories a sender may choose from.
    pub async fn selectable_categories(&self) -> AppResult<Vec<Category>> {
        self.categories.list_selectable().await
    }

    /// Submit a message.
    pub async fn submit(&self, request: SubmitRequest) -> AppResult<SubmissionReport> {
        if request.categories.is_empty() {
            return Err(AppError::Validation("Select at least one category.".to_string()));
        }
        if request.subject.trim().is_empty() {
            return Err(AppError::Validation("Subject is required.".to_string()));
        }

        let categories = self.load_categories(&request.categories).await?;
        let configuration = request.overrides.resolve(&self.defaults);

        let recipients = self.resolver.resolve(&categories).await?;
        if recipients.is_empty() {
            return Err(AppError::Validation(NO_RECIPIENTS.to_string()));
        }

        let message = Message::new(request.subject, request.body, request.categories);
        let batches = partition(&recipients, self.batch_size);

        if self.send_with_queue {
            let queue = self.queue.as_ref().ok_or_else(|| {
                AppError::Config(
                    "Sending with the queue is enabled but no queue is configured".to_string(),
                )
            })?;

            queue
                .enqueue_message(message.clone(), DeliveryOverrides::from(&configuration))
                .await?;
            info!(
                recipients = recipients.len(),
                batches = batches.len(),
                "Queued mass contact message"
            );

            return Ok(SubmissionReport {
                message,
                recipients: recipients.len(),
                batches: batches.len(),
                outcome: SubmissionOutcome::Queued,
                archive: if configuration.create_archive_copy {
                    ArchiveOutcome::Deferred
                } else {
                    ArchiveOutcome::NotRequested
                },
            });
        }

        let mut report = DispatchReport::default();
        let mut failed_batches = 0;
        for batch in &batches {
            match self.dispatcher.dispatch(batch, &message, &configuration).await {
                Ok(batch_report) => report.merge(batch_report),
                Err(e) => {
                    error!(batch_size = batch.len(), error = %e, "Batch delivery failed");
                    failed_batches += 1;
                }
            }
        }

        let (message, archive) = if configuration.create_archive_copy {
            self.archive_copy(message).await
        } else {
            (message, ArchiveOutcome::NotRequested)
        };

        info!(
            message_id = message.id.as_deref().unwrap_or("-"),
            recipients = recipients.len(),
            batches = batches.len(),
            failed_batches,
            delivered = report.delivered,
            "Sent mass contact message"
        );

        Ok(SubmissionReport {
            message,
            recipients: recipients.len(),
            batches: batches.len(),
            outcome: SubmissionOutcome::Sent {
                report,
                failed_batches,
            },
            archive,
        })
    }

    async fn load_categories(&self, ids: &[CategoryId]) -> AppResult<Vec<Category>> {
        let categories = self.categories.load_many(ids).await?;

        let found: BTreeSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        let missing: Vec<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Unknown categories: {}",
                missing.join(", ")
            )));
        }

        Ok(categories)
    }

    async fn archive_copy(&self, message: Message) -> (Message, ArchiveOutcome) {
        match self.archive.save(&message).await {
            Ok(id) => (message.with_id(id.clone()), ArchiveOutcome::Archived(id)),
            Err(e) => {
                warn!(error = %e, "Failed to archive mass contact message");
                (message, ArchiveOutcome::Failed(e.to_string()))
            }
        }
    }
}
