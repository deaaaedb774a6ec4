//! Batch send job.

use masscontact_core::models::{Batch, DeliveryConfiguration, Message};
use serde::{Deserialize, Serialize};

/// Job to deliver a message to one batch of recipients.
///
/// Carries its own copy of the message and configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendBatchJob {
    /// The message to deliver.
    pub message: Message,

    /// Resolved delivery settings, identical for every batch of a message.
    pub configuration: DeliveryConfiguration,

    /// Recipients of this batch.
    pub batch: Batch,
}

impl SendBatchJob {
    /// Create a new send job.
    #[must_use]
    pub const fn new(message: Message, configuration: DeliveryConfiguration, batch: Batch) -> Self {
        Self {
            message,
            configuration,
            batch,
        }
    }
}
