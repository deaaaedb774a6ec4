//! Worker loop driving a queue backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use masscontact_common::{AppError, AppResult};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::backend::QueueBackend;
use crate::retry::RetryConfig;

/// Error returned by a job handler.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The job may succeed if redelivered.
    #[error("{0}")]
    Retry(AppError),

    /// The job can never succeed.
    #[error("{0}")]
    Abort(AppError),
}

impl WorkerError {
    /// Whether the job should be redelivered.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Retry(_))
    }
}

impl From<AppError> for WorkerError {
    fn from(err: AppError) -> Self {
        if err.is_retryable() {
            Self::Retry(err)
        } else {
            Self::Abort(err)
        }
    }
}

/// What happened to a claimed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processed {
    /// Handled and deleted.
    Completed,
    /// Failed and returned to the queue after `attempts` failures.
    Released {
        /// Failures so far.
        attempts: u32,
    },
    /// Failed and dead-lettered.
    Buried,
}

/// Claim and handle one item. Returns `None` if the queue was empty.
///
/// Handler failures never escape; only backend errors are returned.
pub async fn process_next<J, F, Fut>(
    queue: &dyn QueueBackend<J>,
    retry: &RetryConfig,
    handler: &F,
) -> AppResult<Option<Processed>>
where
    J: Clone + Send + 'static,
    F: Fn(J) -> Fut + Sync,
    Fut: Future<Output = Result<(), WorkerError>> + Send,
{
    let Some(claimed) = queue.claim().await? else {
        return Ok(None);
    };

    let item_id = claimed.id().to_string();
    match handler(claimed.job().clone()).await {
        Ok(()) => {
            queue.delete(&claimed).await?;
            Ok(Some(Processed::Completed))
        }
        Err(e) if e.is_retryable() && retry.should_retry(claimed.attempts()) => {
            let attempts = claimed.attempts() + 1;
            warn!(item_id = %item_id, attempts, error = %e, "Job failed, redelivering");
            queue.release(claimed, &e.to_string()).await?;
            Ok(Some(Processed::Released { attempts }))
        }
        Err(e) => {
            error!(
                item_id = %item_id,
                attempts = claimed.attempts() + 1,
                error = %e,
                "Job failed permanently"
            );
            queue.bury(claimed, &e.to_string()).await?;
            Ok(Some(Processed::Buried))
        }
    }
}

/// Process items until the queue is empty. Returns how many were handled.
pub async fn drain<J, F, Fut>(
    queue: &dyn QueueBackend<J>,
    retry: &RetryConfig,
    handler: &F,
) -> AppResult<usize>
where
    J: Clone + Send + 'static,
    F: Fn(J) -> Fut + Sync,
    Fut: Future<Output = Result<(), WorkerError>> + Send,
{
    let mut handled = 0;
    while process_next(queue, retry, handler).await?.is_some() {
        handled += 1;
    }
    Ok(handled)
}

/// Run a worker until `shutdown` becomes `true`.
///
/// The shutdown signal is observed between items; an item being handled is
/// always finished first.
pub async fn run_worker<J, F, Fut>(
    name: &'static str,
    queue: Arc<dyn QueueBackend<J>>,
    retry: RetryConfig,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    handler: F,
) where
    J: Clone + Send + 'static,
    F: Fn(J) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), WorkerError>> + Send,
{
    info!(worker = name, "Worker started");

    while !*shutdown.borrow() {
        let pause = match process_next(queue.as_ref(), &retry, &handler).await {
            Ok(Some(Processed::Released { attempts })) => {
                Some(retry.delay_for_attempt(attempts.saturating_sub(1)))
            }
            Ok(Some(_)) => None,
            Ok(None) => Some(poll_interval),
            Err(e) => {
                error!(worker = name, error = %e, "Queue backend error");
                Some(poll_interval)
            }
        };

        if let Some(pause) = pause.filter(|p| !p.is_zero()) {
            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    info!(worker = name, "Worker stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryQueue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_success_deletes_item() {
        let queue = MemoryQueue::new();
        queue.enqueue(1u32).await.unwrap();

        let result = process_next(&queue, &RetryConfig::immediate(3), &|_: u32| async {
            Ok::<(), WorkerError>(())
        })
            .await
            .unwrap();

        assert_eq!(result, Some(Processed::Completed));
        assert_eq!(queue.in_flight().await, 0);
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retryable_failure_redelivered_until_limit() {
        let queue = MemoryQueue::new();
        queue.enqueue(1u32).await.unwrap();
        let calls = AtomicUsize::new(0);
        let handler = |_: u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(WorkerError::from(AppError::Transport("refused".to_string()))) }
        };

        let handled = drain(&queue, &RetryConfig::immediate(2), &handler).await.unwrap();

        assert_eq!(handled, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let dead = queue.dead_letters().await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_buried_immediately() {
        let queue = MemoryQueue::new();
        queue.enqueue(1u32).await.unwrap();
        let handler =
            |_: u32| async { Err(WorkerError::from(AppError::Config("bad".to_string()))) };

        let result = process_next(&queue, &RetryConfig::immediate(5), &handler).await.unwrap();

        assert_eq!(result, Some(Processed::Buried));
    }

    #[tokio::test]
    async fn test_run_worker_stops_on_shutdown() {
        let queue: Arc<dyn QueueBackend<u32>> = Arc::new(MemoryQueue::new());
        queue.enqueue(7).await.unwrap();
        let (tx, rx) = watch::channel(false);
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();

        let worker = tokio::spawn(run_worker(
            "test",
            queue.clone(),
            RetryConfig::immediate(0),
            Duration::from_millis(10),
            rx,
            move |job| {
                let seen_tx = seen_tx.clone();
                async move {
                    seen_tx.send(job).ok();
                    Ok(())
                }
            },
        ));

        assert_eq!(seen_rx.recv().await, Some(7));
        tx.send(true).unwrap();
        worker.await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 0);
    }
}
