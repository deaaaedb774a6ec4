//! Batch send worker.

use masscontact_core::MessageDispatcher;
use tracing::{error, info};

use super::WorkerError;
use crate::jobs::SendBatchJob;

/// Context for the send worker.
#[derive(Clone)]
pub struct SendContext {
    pub dispatcher: MessageDispatcher,
}

impl SendContext {
    /// Create a new send context.
    #[must_use]
    pub const fn new(dispatcher: MessageDispatcher) -> Self {
        Self { dispatcher }
    }
}

/// Worker function for delivering one batch.
///
/// # Errors
/// Returns an error if the batch failed as a whole, e.g. a BCC transport
/// failure. Individual recipient failures are logged by the dispatcher.
pub async fn send_batch_worker(job: SendBatchJob, ctx: &SendContext) -> Result<(), WorkerError> {
    match ctx
        .dispatcher
        .dispatch(&job.batch, &job.message, &job.configuration)
        .await
    {
        Ok(report) => {
            info!(
                batch_size = job.batch.len(),
                delivered = report.delivered,
                failed = report.failed,
                "Batch processed"
            );
            Ok(())
        }
        Err(e) => {
            error!(batch_size = job.batch.len(), error = %e, "Failed to deliver batch");
            Err(e.into())
        }
    }
}
