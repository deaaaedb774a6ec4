//! Background delivery pipeline for masscontact-rs.
//!
//! This crate provides the asynchronous, two-stage delivery path:
//!
//! - **Jobs**: message fan-out and batch send jobs
//! - **Backends**: durable FIFO queues in Redis or in memory
//! - **Workers**: resolve and send handlers plus the loop that drives them
//! - **Retry**: bounded redelivery with a dead letter list

pub mod backend;
pub mod delivery_impl;
pub mod jobs;
pub mod retry;
pub mod workers;

pub use backend::{Claimed, Envelope, MemoryQueue, QueueBackend, RedisQueue, connect};
pub use delivery_impl::DeliveryQueue;
pub use jobs::*;
pub use retry::{DeadLetterEntry, RetryConfig};
pub use workers::*;
