//! Message fan-out job.

use masscontact_core::models::{DeliveryOverrides, Message};
use serde::{Deserialize, Serialize};

/// Job to resolve a message's recipients and queue one send per batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveMessageJob {
    /// The message to fan out.
    pub message: Message,

    /// Caller settings; defaults are filled in by the worker.
    pub configuration: DeliveryOverrides,
}

impl ResolveMessageJob {
    /// Create a new resolve job.
    #[must_use]
    pub const fn new(message: Message, configuration: DeliveryOverrides) -> Self {
        Self {
            message,
            configuration,
        }
    }
}
