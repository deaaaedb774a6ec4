//! Core delivery pipeline for masscontact-rs.
//!
//! A submitted [`models::Message`] is resolved into a deduplicated,
//! opt-out filtered [`models::RecipientSet`], split into bounded
//! [`models::Batch`]es and handed to a [`traits::MailTransport`] by the
//! [`services::MessageDispatcher`], either immediately or through the queue
//! crate's two-stage pipeline.

pub mod adapters;
pub mod models;
pub mod providers;
pub mod services;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use services::*;
