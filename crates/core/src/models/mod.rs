//! Domain models for the mass contact pipeline.

mod category;
mod configuration;
mod mail;
mod message;
mod recipient;

pub use category::{Category, CategoryId, ProviderBinding, ProviderConfig};
pub use configuration::{DeliveryConfiguration, DeliveryDefaults, DeliveryOverrides};
pub use mail::{MAIL_KEY, MailParams, OutgoingMail};
pub use message::{BodyFormat, Message, MessageBody, MessageId};
pub use recipient::{
    Batch, OPT_OUT_ALL, OPT_OUT_NONE, OptOutCriteria, RecipientId, RecipientRecord, RecipientSet,
};
