//! Redis list queue backend.
//!
//! Each queue uses three lists under `{prefix}:{name}`:
//! `pending` (enqueued on the left, claimed from the right), `processing`
//! (claimed, unfinished) and `dead`. Claims move items atomically with
//! `LMOVE`; release and bury run as a Lua script that only pushes when the
//! item was still in flight, so an item is always on exactly one list.

use std::marker::PhantomData;

use async_trait::async_trait;
use masscontact_common::{AppError, AppResult, IdGenerator};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use super::{Claimed, Envelope, QueueBackend};
use crate::retry::DeadLetterEntry;

/// Open a shared, auto-reconnecting Redis connection.
pub async fn connect(redis_url: &str) -> AppResult<ConnectionManager> {
    let client = Client::open(redis_url).map_err(|e| AppError::Redis(e.to_string()))?;
    ConnectionManager::new(client)
        .await
        .map_err(|e| AppError::Redis(e.to_string()))
}

// KEYS[1] processing, KEYS[2] target, ARGV[1] receipt, ARGV[2] new value.
const MOVE_IN_FLIGHT: &str = r"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) == 1 then
    redis.call('LPUSH', KEYS[2], ARGV[2])
    return 1
end
return 0
";

fn redis_error(e: redis::RedisError) -> AppError {
    AppError::Redis(e.to_string())
}

/// Queue stored in Redis lists.
pub struct RedisQueue<J> {
    conn: ConnectionManager,
    pending: String,
    processing: String,
    dead: String,
    id_gen: IdGenerator,
    move_script: Script,
    _job: PhantomData<fn() -> J>,
}

impl<J> RedisQueue<J> {
    /// Create a queue named `name` under `prefix`.
    #[must_use]
    pub fn new(conn: ConnectionManager, prefix: &str, name: &str) -> Self {
        Self {
            conn,
            pending: format!("{prefix}:{name}:pending"),
            processing: format!("{prefix}:{name}:processing"),
            dead: format!("{prefix}:{name}:dead"),
            id_gen: IdGenerator::new(),
            move_script: Script::new(MOVE_IN_FLIGHT),
            _job: PhantomData,
        }
    }

    /// Key of the pending list.
    #[must_use]
    pub fn pending_key(&self) -> &str {
        &self.pending
    }

    /// Remove `receipt` from the processing list and push `value` onto `target`.
    ///
    /// Nothing is pushed unless the receipt was still in flight.
    async fn move_in_flight(&self, receipt: &str, target: &str, value: String) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let moved: usize = self
            .move_script
            .key(&self.processing)
            .key(target)
            .arg(receipt)
            .arg(value)
            .invoke_async(&mut conn)
            .await
            .map_err(redis_error)?;

        if moved == 0 {
            return Err(AppError::Queue(format!(
                "Item was not in flight on {}",
                self.processing
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<J> QueueBackend<J> for RedisQueue<J>
where
    J: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn enqueue(&self, job: J) -> AppResult<()> {
        let envelope = Envelope {
            id: self.id_gen.generate(),
            attempts: 0,
            last_error: None,
            job,
        };
        let raw = serde_json::to_string(&envelope)?;

        let mut conn = self.conn.clone();
        let _: usize = conn.lpush(&self.pending, raw).await.map_err(redis_error)?;
        Ok(())
    }

    async fn claim(&self) -> AppResult<Option<Claimed<J>>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("LMOVE")
            .arg(&self.pending)
            .arg(&self.processing)
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<Envelope<J>>(&raw) {
            Ok(envelope) => Ok(Some(Claimed {
                envelope,
                receipt: raw,
            })),
            Err(e) => {
                error!(queue = %self.pending, error = %e, "Dead-lettering undecodable item");
                self.move_in_flight(&raw, &self.dead, raw.clone()).await?;
                Err(AppError::Serialization(e.to_string()))
            }
        }
    }

    async fn delete(&self, claimed: &Claimed<J>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .lrem(&self.processing, 1, &claimed.receipt)
            .await
            .map_err(redis_error)?;

        if removed == 0 {
            return Err(AppError::Queue(format!(
                "Item {} was not in flight",
                claimed.id()
            )));
        }
        Ok(())
    }

    async fn release(&self, claimed: Claimed<J>, error: &str) -> AppResult<()> {
        let Claimed {
            mut envelope,
            receipt,
        } = claimed;
        envelope.attempts += 1;
        envelope.last_error = Some(error.to_string());
        let raw = serde_json::to_string(&envelope)?;

        self.move_in_flight(&receipt, &self.pending, raw).await
    }

    async fn bury(&self, claimed: Claimed<J>, error: &str) -> AppResult<()> {
        let Claimed { envelope, receipt } = claimed;
        let entry = DeadLetterEntry::new(envelope.job, envelope.attempts + 1, error.to_string());
        let raw = serde_json::to_string(&entry)?;

        self.move_in_flight(&receipt, &self.dead, raw).await
    }

    async fn recover(&self) -> AppResult<usize> {
        let mut conn = self.conn.clone();
        let mut count = 0;

        // Newest in-flight item first, each pushed onto the claim end.
        loop {
            let moved: Option<String> = redis::cmd("LMOVE")
                .arg(&self.processing)
                .arg(&self.pending)
                .arg("LEFT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await
                .map_err(redis_error)?;

            if moved.is_none() {
                break;
            }
            count += 1;
        }

        if count > 0 {
            info!(queue = %self.pending, count, "Recovered in-flight items");
        }
        Ok(count)
    }

    async fn len(&self) -> AppResult<usize> {
        let mut conn = self.conn.clone();
        conn.llen(&self.pending).await.map_err(redis_error)
    }

    async fn dead_letters(&self) -> AppResult<Vec<DeadLetterEntry<J>>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.lrange(&self.dead, 0, -1).await.map_err(redis_error)?;

        // Newest is on the left. Undecodable items are kept raw and skipped.
        Ok(raw
            .iter()
            .rev()
            .filter_map(|r| match serde_json::from_str(r) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(queue = %self.dead, error = %e, "Skipping undecodable dead letter");
                    None
                }
            })
            .collect())
    }
}
