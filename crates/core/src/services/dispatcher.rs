//! Batch dispatch through a mail transport.

use std::collections::BTreeMap;
use std::sync::Arc;

use lettre::Address;
use masscontact_common::AppResult;
use tracing::{debug, info, warn};

use crate::models::{
    Batch, DeliveryConfiguration, MAIL_KEY, MailParams, Message, OutgoingMail, RecipientRecord,
};
use crate::traits::{MailTransport, RecipientDirectory};

/// Outcome of dispatching one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Recipients handed to the transport successfully.
    pub delivered: usize,
    /// Recipients that no longer exist or are inactive.
    pub skipped: usize,
    /// Recipients whose individual send failed.
    pub failed: usize,
    /// Number of transport calls made.
    pub transport_calls: usize,
}

impl DispatchReport {
    /// Accumulate another report.
    pub const fn merge(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.transport_calls += other.transport_calls;
    }
}

/// Sends a batch, re-validating every recipient at send time.
#[derive(Clone)]
pub struct MessageDispatcher {
    transport: Arc<dyn MailTransport>,
    directory: Arc<dyn RecipientDirectory>,
    default_language: String,
}

impl MessageDispatcher {
    /// Create a new dispatcher. BCC mails are rendered in `default_language`.
    pub fn new(
        transport: Arc<dyn MailTransport>,
        directory: Arc<dyn RecipientDirectory>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            directory,
            default_language: default_language.into(),
        }
    }

    /// Deliver `message` to the recipients of `batch`.
    ///
    /// In BCC mode a transport failure fails the whole batch. Otherwise
    /// failures are counted per recipient and the batch continues.
    pub async fn dispatch(
        &self,
        batch: &Batch,
        message: &Message,
        configuration: &DeliveryConfiguration,
    ) -> AppResult<DispatchReport> {
        let report = if configuration.use_bcc {
            self.dispatch_bcc(batch, message, configuration).await?
        } else {
            self.dispatch_individually(batch, message, configuration).await
        };

        info!(
            message_id = message.id.as_deref().unwrap_or("-"),
            batch_size = batch.len(),
            use_bcc = configuration.use_bcc,
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            "Dispatched batch"
        );

        Ok(report)
    }

    async fn dispatch_bcc(
        &self,
        batch: &Batch,
        message: &Message,
        configuration: &DeliveryConfiguration,
    ) -> AppResult<DispatchReport> {
        let mut report = DispatchReport::default();
        let mut emails = Vec::with_capacity(batch.len());

        for id in batch {
            match self.directory.load(id).await? {
                Some(record) if record.active => {
                    // One unparsable address would reject the whole mail.
                    if let Err(e) = record.email.parse::<Address>() {
                        warn!(recipient_id = %id, error = %e, "Skipping invalid recipient address");
                        report.failed += 1;
                    } else {
                        emails.push(record.email);
                    }
                }
                _ => report.skipped += 1,
            }
        }

        if emails.is_empty() {
            debug!(batch_size = batch.len(), "No eligible recipients left in BCC batch");
            return Ok(report);
        }

        let mut headers = BTreeMap::new();
        headers.insert("Bcc".to_string(), emails.join(","));

        let mail = OutgoingMail {
            key: MAIL_KEY,
            to: configuration.sender_email.clone(),
            from: configuration.sender(),
            language: self.default_language.clone(),
            params: params(message, headers),
        };

        self.transport.send(mail).await?;
        report.transport_calls = 1;
        report.delivered = emails.len();

        Ok(report)
    }

    async fn dispatch_individually(
        &self,
        batch: &Batch,
        message: &Message,
        configuration: &DeliveryConfiguration,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let from = configuration.sender();

        for id in batch {
            let record = match self.directory.load(id).await {
                Ok(Some(record)) if record.active => record,
                Ok(_) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(recipient_id = %id, error = %e, "Failed to load recipient");
                    report.failed += 1;
                    continue;
                }
            };

            let RecipientRecord { email, language, .. } = record;
            let mail = OutgoingMail {
                key: MAIL_KEY,
                to: email,
                from: from.clone(),
                language,
                params: params(message, BTreeMap::new()),
            };

            report.transport_calls += 1;
            match self.transport.send(mail).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(recipient_id = %id, error = %e, "Failed to send mass contact mail");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

fn params(message: &Message, headers: BTreeMap<String, String>) -> MailParams {
    MailParams {
        subject: message.subject.clone(),
        body: message.body.clone(),
        headers,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::MessageBody;
    use crate::testing::{InMemoryDirectory, RecordingTransport};
    use masscontact_common::AppError;

    fn configuration(use_bcc: bool) -> DeliveryConfiguration {
        DeliveryConfiguration {
            use_bcc,
            sender_name: "Site".to_string(),
            sender_email: "site@example.com".to_string(),
            create_archive_copy: false,
        }
    }

    fn message() -> Message {
        Message::new("Hello", MessageBody::plain("Body"), vec!["editors".to_string()])
    }

    fn setup() -> (MessageDispatcher, Arc<RecordingTransport>, Arc<InMemoryDirectory>) {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.insert_active("alice", None);
        directory.insert_active("bob", None);
        directory.insert_inactive("carol", None);
        directory.set_language("bob", "fr");

        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = MessageDispatcher::new(transport.clone(), directory.clone(), "en");
        (dispatcher, transport, directory)
    }

    fn batch(ids: &[&str]) -> Batch {
        Batch::from(ids.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_individual_mode_sends_one_mail_per_eligible_recipient() {
        let (dispatcher, transport, _) = setup();

        let report = dispatcher
            .dispatch(&batch(&["alice", "bob", "carol", "ghost"]), &message(), &configuration(false))
            .await
            .unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.transport_calls, 2);

        let sent = transport.sent();
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[1].to, "bob@example.com");
        assert_eq!(sent[1].language, "fr");
        assert_eq!(sent[0].from, "Site <site@example.com>");
        assert_eq!(sent[0].key, "mass_contact");
        assert!(sent.iter().all(|m| m.bcc().is_none()));
    }

    #[tokio::test]
    async fn test_bcc_mode_sends_single_mail() {
        let (dispatcher, transport, _) = setup();

        let report = dispatcher
            .dispatch(&batch(&["alice", "bob", "carol"]), &message(), &configuration(true))
            .await
            .unwrap();

        assert_eq!(report.transport_calls, 1);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 1);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "site@example.com");
        assert_eq!(sent[0].language, "en");
        assert_eq!(sent[0].bcc(), Some("alice@example.com,bob@example.com"));
    }

    #[tokio::test]
    async fn test_deactivated_recipient_skipped_without_affecting_others() {
        let (dispatcher, transport, directory) = setup();
        directory.deactivate("alice");

        let report = dispatcher
            .dispatch(&batch(&["alice", "bob"]), &message(), &configuration(false))
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(transport.sent()[0].to, "bob@example.com");
    }

    #[tokio::test]
    async fn test_bcc_batch_with_nobody_eligible_makes_no_call() {
        let (dispatcher, transport, _) = setup();

        let report = dispatcher
            .dispatch(&batch(&["carol", "ghost"]), &message(), &configuration(true))
            .await
            .unwrap();

        assert_eq!(report.transport_calls, 0);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_individual_failure_is_isolated() {
        let (dispatcher, transport, _) = setup();
        transport.fail_for("alice@example.com");

        let report = dispatcher
            .dispatch(&batch(&["alice", "bob"]), &message(), &configuration(false))
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_bcc_failure_fails_batch() {
        let (dispatcher, transport, _) = setup();
        transport.fail_for("site@example.com");

        let err = dispatcher
            .dispatch(&batch(&["alice"]), &message(), &configuration(true))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn test_bcc_skips_invalid_address_and_sends_to_the_rest() {
        let (dispatcher, transport, directory) = setup();
        directory.insert_active("dave", None);
        directory.set_email("dave", "dave@@example");

        let report = dispatcher
            .dispatch(&batch(&["alice", "dave", "bob"]), &message(), &configuration(true))
            .await
            .unwrap();

        assert_eq!(report.transport_calls, 1);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(
            transport.sent()[0].bcc(),
            Some("alice@example.com,bob@example.com")
        );
    }
}
