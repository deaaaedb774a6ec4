//! Message fan-out worker.

use std::sync::Arc;

use masscontact_core::models::{DeliveryDefaults, Message};
use masscontact_core::traits::{ArchiveStore, CategoryStore};
use masscontact_core::{RecipientResolver, partition};
use tracing::{info, warn};

use super::WorkerError;
use crate::delivery_impl::DeliveryQueue;
use crate::jobs::ResolveMessageJob;

/// Context for the resolve worker.
#[derive(Clone)]
pub struct ResolveContext {
    pub categories: Arc<dyn CategoryStore>,
    pub resolver: RecipientResolver,
    pub archive: Arc<dyn ArchiveStore>,
    pub queue: DeliveryQueue,
    pub defaults: DeliveryDefaults,
    pub batch_size: usize,
}

/// What a resolve job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Recipients resolved.
    pub recipients: usize,
    /// Send jobs queued.
    pub batches: usize,
    /// Archive id, if a copy was saved.
    pub archived: Option<String>,
}

/// Worker function for fanning a message out into send jobs.
///
/// Resolution happens again here because the directory may have changed
/// since submission.
///
/// # Errors
/// Returns an error if resolution or queueing fails. Archive failures are
/// logged only, since the batches are already queued.
pub async fn resolve_message_worker(
    job: ResolveMessageJob,
    ctx: &ResolveContext,
) -> Result<ResolveSummary, WorkerError> {
    let ResolveMessageJob {
        message,
        configuration,
    } = job;
    let configuration = configuration.resolve(&ctx.defaults);

    let categories = ctx.categories.load_many(&message.categories).await?;
    if categories.len() < message.categories.len() {
        warn!(
            requested = message.categories.len(),
            found = categories.len(),
            "Some categories no longer exist"
        );
    }

    let recipients = ctx.resolver.resolve(&categories).await?;
    let batches = partition(&recipients, ctx.batch_size);
    let batch_count = batches.len();

    for batch in batches {
        ctx.queue
            .enqueue_batch(message.clone(), configuration.clone(), batch)
            .await?;
    }

    info!(
        recipients = recipients.len(),
        batches = batch_count,
        "Queued batches for message"
    );

    let archived = if configuration.create_archive_copy {
        archive(ctx, &message).await
    } else {
        None
    };

    Ok(ResolveSummary {
        recipients: recipients.len(),
        batches: batch_count,
        archived,
    })
}

async fn archive(ctx: &ResolveContext, message: &Message) -> Option<String> {
    match ctx.archive.save(message).await {
        Ok(id) => {
            info!(message_id = %id, "Archived mass contact message");
            Some(id)
        }
        Err(e) => {
            warn!(error = %e, "Failed to archive mass contact message");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::{MemoryQueue, QueueBackend};
    use crate::jobs::SendBatchJob;
    use masscontact_common::{MassContactSettings, OptOutMode};
    use masscontact_core::models::{Category, DeliveryOverrides, MessageBody, ProviderConfig};
    use masscontact_core::testing::{
        InMemoryArchive, InMemoryCategoryStore, InMemoryDirectory, StaticProvider,
    };
    use masscontact_core::{OptOutFilter, ProviderRegistry};

    struct Fixture {
        ctx: ResolveContext,
        batches: Arc<MemoryQueue<SendBatchJob>>,
        archive: Arc<InMemoryArchive>,
    }

    fn fixture(members: usize, batch_size: usize) -> Fixture {
        let directory = Arc::new(InMemoryDirectory::new());
        let ids: Vec<String> = (0..members).map(|i| format!("user{i:02}")).collect();
        for id in &ids {
            directory.insert_active(id, None);
        }

        let registry = ProviderRegistry::new()
            .with(Arc::new(StaticProvider::new("role").with_group("staff", ids)));
        let resolver = RecipientResolver::new(
            Arc::new(registry),
            OptOutFilter::new(OptOutMode::Disabled, directory),
        );

        let categories = Arc::new(InMemoryCategoryStore::new([Category::new("staff", "Staff")
            .with_binding("role", ProviderConfig::new(["staff"]))]));
        let archive = Arc::new(InMemoryArchive::new());
        let messages: Arc<MemoryQueue<ResolveMessageJob>> = Arc::new(MemoryQueue::new());
        let batches: Arc<MemoryQueue<SendBatchJob>> = Arc::new(MemoryQueue::new());

        let settings = MassContactSettings {
            default_sender_email: "site@example.com".to_string(),
            ..Default::default()
        };

        Fixture {
            ctx: ResolveContext {
                categories,
                resolver,
                archive: archive.clone(),
                queue: DeliveryQueue::new(messages, batches.clone()),
                defaults: DeliveryDefaults::from(&settings),
                batch_size,
            },
            batches,
            archive,
        }
    }

    fn job(categories: &[&str], overrides: DeliveryOverrides) -> ResolveMessageJob {
        ResolveMessageJob::new(
            Message::new(
                "Notice",
                MessageBody::plain("Body"),
                categories.iter().map(ToString::to_string).collect(),
            ),
            overrides,
        )
    }

    #[tokio::test]
    async fn test_fans_out_then_archives() {
        let f = fixture(12, 5);

        let summary = resolve_message_worker(job(&["staff"], DeliveryOverrides::default()), &f.ctx)
            .await
            .unwrap();

        assert_eq!(summary.recipients, 12);
        assert_eq!(summary.batches, 3);
        assert!(summary.archived.is_some());
        assert_eq!(f.batches.len().await.unwrap(), 3);
        assert_eq!(f.archive.saved().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_disabled_by_override() {
        let f = fixture(3, 5);
        let overrides = DeliveryOverrides {
            create_archive_copy: Some(false),
            ..Default::default()
        };

        let summary = resolve_message_worker(job(&["staff"], overrides), &f.ctx)
            .await
            .unwrap();

        assert_eq!(summary.archived, None);
        assert!(f.archive.saved().is_empty());
    }

    #[tokio::test]
    async fn test_archive_failure_does_not_fail_job() {
        let f = fixture(3, 5);
        f.archive.fail();

        let summary = resolve_message_worker(job(&["staff"], DeliveryOverrides::default()), &f.ctx)
            .await
            .unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.archived, None);
        assert_eq!(f.batches.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleted_category_is_skipped() {
        let f = fixture(3, 5);

        let summary = resolve_message_worker(
            job(&["staff", "removed"], DeliveryOverrides::default()),
            &f.ctx,
        )
        .await
        .unwrap();

        assert_eq!(summary.recipients, 3);
        assert_eq!(summary.batches, 1);
    }

    #[tokio::test]
    async fn test_defaults_fill_batch_configuration() {
        let f = fixture(3, 5);

        resolve_message_worker(job(&["staff"], DeliveryOverrides::default()), &f.ctx)
            .await
            .unwrap();

        let claimed = f.batches.claim().await.unwrap().unwrap();
        assert!(claimed.job().configuration.use_bcc);
        assert_eq!(claimed.job().configuration.sender_email, "site@example.com");
    }
}
