//! In-process queue backend.

use std::collections::VecDeque;

use async_trait::async_trait;
use masscontact_common::{AppError, AppResult, IdGenerator};
use tokio::sync::Mutex;

use super::{Claimed, Envelope, QueueBackend};
use crate::retry::DeadLetterEntry;

struct State<J> {
    pending: VecDeque<Envelope<J>>,
    /// In claim order.
    processing: Vec<Envelope<J>>,
    dead: Vec<DeadLetterEntry<J>>,
}

/// Queue held in memory; contents are lost on restart.
pub struct MemoryQueue<J> {
    state: Mutex<State<J>>,
    id_gen: IdGenerator,
}

impl<J> Default for MemoryQueue<J> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                pending: VecDeque::new(),
                processing: Vec::new(),
                dead: Vec::new(),
            }),
            id_gen: IdGenerator::new(),
        }
    }
}

impl<J> MemoryQueue<J> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of claimed, unfinished items.
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.processing.len()
    }

    fn not_in_flight(receipt: &str) -> AppError {
        AppError::Queue(format!("Item {receipt} is not in flight"))
    }
}

impl<J> State<J> {
    fn take_in_flight(&mut self, receipt: &str) -> AppResult<Envelope<J>> {
        let index = self
            .processing
            .iter()
            .position(|e| e.id == receipt)
            .ok_or_else(|| MemoryQueue::<J>::not_in_flight(receipt))?;
        Ok(self.processing.remove(index))
    }
}

#[async_trait]
impl<J> QueueBackend<J> for MemoryQueue<J>
where
    J: Clone + Send + Sync + 'static,
{
    async fn enqueue(&self, job: J) -> AppResult<()> {
        let envelope = Envelope {
            id: self.id_gen.generate(),
            attempts: 0,
            last_error: None,
            job,
        };
        self.state.lock().await.pending.push_back(envelope);
        Ok(())
    }

    async fn claim(&self) -> AppResult<Option<Claimed<J>>> {
        let mut state = self.state.lock().await;
        let Some(envelope) = state.pending.pop_front() else {
            return Ok(None);
        };

        let receipt = envelope.id.clone();
        state.processing.push(envelope.clone());
        Ok(Some(Claimed { envelope, receipt }))
    }

    async fn delete(&self, claimed: &Claimed<J>) -> AppResult<()> {
        self.state
            .lock()
            .await
            .take_in_flight(&claimed.receipt)
            .map(|_| ())
    }

    async fn release(&self, claimed: Claimed<J>, error: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let mut envelope = state.take_in_flight(&claimed.receipt)?;

        envelope.attempts += 1;
        envelope.last_error = Some(error.to_string());
        state.pending.push_back(envelope);
        Ok(())
    }

    async fn bury(&self, claimed: Claimed<J>, error: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let envelope = state.take_in_flight(&claimed.receipt)?;

        state.dead.push(DeadLetterEntry::new(
            envelope.job,
            envelope.attempts + 1,
            error.to_string(),
        ));
        Ok(())
    }

    async fn recover(&self) -> AppResult<usize> {
        let mut state = self.state.lock().await;
        let recovered = std::mem::take(&mut state.processing);

        let count = recovered.len();
        for envelope in recovered.into_iter().rev() {
            state.pending.push_front(envelope);
        }
        Ok(count)
    }

    async fn len(&self) -> AppResult<usize> {
        Ok(self.state.lock().await.pending.len())
    }

    async fn dead_letters(&self) -> AppResult<Vec<DeadLetterEntry<J>>> {
        Ok(self.state.lock().await.dead.clone())
    }
}
