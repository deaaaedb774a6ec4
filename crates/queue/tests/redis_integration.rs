//! Redis integration tests.
//!
//! These tests require a running Redis instance.
//! Run with: `cargo test --test redis_integration -- --ignored`
//!
//! Set `REDIS_URL` environment variable to point to your Redis instance.
//! Default: <redis://localhost:6379>

#![allow(clippy::unwrap_used)]

use masscontact_common::IdGenerator;
use masscontact_queue::{QueueBackend, RedisQueue, connect};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Ping {
    n: u32,
}

fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

/// A queue under a prefix no other test run shares.
async fn fresh_queue() -> (RedisQueue<Ping>, String) {
    let conn = connect(&get_redis_url())
        .await
        .expect("Failed to connect to Redis");
    let prefix = format!("masscontact-test-{}", IdGenerator::new().generate());
    (RedisQueue::new(conn, &prefix, "pings"), prefix)
}

async fn cleanup(prefix: &str) {
    let mut conn = connect(&get_redis_url()).await.unwrap();
    for list in ["pending", "processing", "dead"] {
        let _: usize = conn.del(format!("{prefix}:pings:{list}")).await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_redis_connection() {
    let conn = connect(&get_redis_url()).await;
    assert!(conn.is_ok(), "Failed to connect to Redis: {:?}", conn.err());
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_fifo_claim_and_delete() {
    let (queue, prefix) = fresh_queue().await;
    assert_eq!(queue.pending_key(), format!("{prefix}:pings:pending"));

    for n in 1..=3 {
        queue.enqueue(Ping { n }).await.unwrap();
    }
    assert_eq!(queue.len().await.unwrap(), 3);

    let first = queue.claim().await.unwrap().unwrap();
    assert_eq!(first.job(), &Ping { n: 1 });
    assert_eq!(first.attempts(), 0);
    queue.delete(&first).await.unwrap();

    let second = queue.claim().await.unwrap().unwrap();
    assert_eq!(second.job(), &Ping { n: 2 });
    assert_eq!(queue.len().await.unwrap(), 1);

    cleanup(&prefix).await;
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_release_redelivers_with_attempts() {
    let (queue, prefix) = fresh_queue().await;
    queue.enqueue(Ping { n: 7 }).await.unwrap();

    let claimed = queue.claim().await.unwrap().unwrap();
    let id = claimed.id().to_string();
    queue.release(claimed, "smtp timeout").await.unwrap();

    let again = queue.claim().await.unwrap().unwrap();
    assert_eq!(again.id(), id);
    assert_eq!(again.attempts(), 1);
    assert_eq!(again.envelope.last_error.as_deref(), Some("smtp timeout"));

    cleanup(&prefix).await;
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_bury_moves_to_dead_letters() {
    let (queue, prefix) = fresh_queue().await;
    queue.enqueue(Ping { n: 9 }).await.unwrap();

    let claimed = queue.claim().await.unwrap().unwrap();
    queue.bury(claimed, "mailbox unavailable").await.unwrap();

    assert_eq!(queue.len().await.unwrap(), 0);
    assert!(queue.claim().await.unwrap().is_none());

    let dead = queue.dead_letters().await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].job, Ping { n: 9 });
    assert_eq!(dead[0].attempts, 1);
    assert_eq!(dead[0].last_error, "mailbox unavailable");

    cleanup(&prefix).await;
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_recover_returns_in_flight_items_first() {
    let (queue, prefix) = fresh_queue().await;
    for n in 1..=3 {
        queue.enqueue(Ping { n }).await.unwrap();
    }

    // Two claims abandoned by a crashed worker.
    let _a = queue.claim().await.unwrap().unwrap();
    let _b = queue.claim().await.unwrap().unwrap();

    assert_eq!(queue.recover().await.unwrap(), 2);
    assert_eq!(queue.len().await.unwrap(), 3);

    let order: Vec<u32> = {
        let mut order = Vec::new();
        while let Some(claimed) = queue.claim().await.unwrap() {
            order.push(claimed.job().n);
            queue.delete(&claimed).await.unwrap();
        }
        order
    };
    assert_eq!(order, vec![1, 2, 3]);

    cleanup(&prefix).await;
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_undecodable_item_is_dead_lettered() {
    let (queue, prefix) = fresh_queue().await;
    let mut conn = connect(&get_redis_url()).await.unwrap();
    let _: usize = conn.lpush(queue.pending_key(), "not json").await.unwrap();

    assert!(queue.claim().await.is_err());
    assert_eq!(queue.len().await.unwrap(), 0);
    // Raw entry is kept but cannot be listed as a typed dead letter.
    assert!(queue.dead_letters().await.unwrap().is_empty());
    let raw: usize = conn.llen(format!("{prefix}:pings:dead")).await.unwrap();
    assert_eq!(raw, 1);

    cleanup(&prefix).await;
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_release_after_recover_does_not_duplicate() {
    let (queue, prefix) = fresh_queue().await;
    queue.enqueue(Ping { n: 4 }).await.unwrap();

    // A second process recovered the item while this claim was still held.
    let claimed = queue.claim().await.unwrap().unwrap();
    assert_eq!(queue.recover().await.unwrap(), 1);

    assert!(queue.release(claimed, "smtp timeout").await.is_err());
    assert_eq!(queue.len().await.unwrap(), 1);

    let again = queue.claim().await.unwrap().unwrap();
    assert!(queue.bury(again.clone(), "gone").await.is_ok());
    assert!(queue.bury(again, "gone").await.is_err());
    assert_eq!(queue.dead_letters().await.unwrap().len(), 1);

    cleanup(&prefix).await;
}
