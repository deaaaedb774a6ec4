//! Durable FIFO queue backends with at-least-once delivery.
//!
//! A claimed item stays invisible to other workers until it is deleted
//! (success), released (redelivery) or buried (dead-lettered). Items held by
//! a worker that died are returned to the queue by [`QueueBackend::recover`].

mod memory_queue;
mod redis_queue;

pub use memory_queue::MemoryQueue;
pub use redis_queue::{RedisQueue, connect};

use async_trait::async_trait;
use masscontact_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::retry::DeadLetterEntry;

/// Serialized form of a queued job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<J> {
    /// Item id, stable across redeliveries.
    pub id: String,
    /// Number of failed attempts so far.
    pub attempts: u32,
    /// Error of the most recent failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// The job.
    pub job: J,
}

/// An item claimed by a worker.
#[derive(Debug, Clone)]
pub struct Claimed<J> {
    /// The claimed envelope.
    pub envelope: Envelope<J>,
    /// Backend-specific handle identifying the in-flight item.
    pub(crate) receipt: String,
}

impl<J> Claimed<J> {
    /// Item id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }

    /// Number of failed attempts before this one.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.envelope.attempts
    }

    /// The job.
    #[must_use]
    pub const fn job(&self) -> &J {
        &self.envelope.job
    }
}

/// A durable FIFO queue of jobs of type `J`.
#[async_trait]
pub trait QueueBackend<J: Send + 'static>: Send + Sync {
    /// Append a job.
    async fn enqueue(&self, job: J) -> AppResult<()>;

    /// Claim the oldest pending item, if any.
    async fn claim(&self) -> AppResult<Option<Claimed<J>>>;

    /// Remove a successfully processed item.
    async fn delete(&self, claimed: &Claimed<J>) -> AppResult<()>;

    /// Return a failed item to the queue with its attempt counter increased.
    async fn release(&self, claimed: Claimed<J>, error: &str) -> AppResult<()>;

    /// Move a failed item to the dead letter list.
    async fn bury(&self, claimed: Claimed<J>, error: &str) -> AppResult<()>;

    /// Return every in-flight item to the queue. Returns how many moved.
    ///
    /// Only safe while no worker of this queue is running.
    async fn recover(&self) -> AppResult<usize>;

    /// Number of pending items.
    async fn len(&self) -> AppResult<usize>;

    /// Dead-lettered items, oldest first.
    async fn dead_letters(&self) -> AppResult<Vec<DeadLetterEntry<J>>>;
}
