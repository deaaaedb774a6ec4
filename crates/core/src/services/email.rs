//! SMTP mail transport.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use masscontact_common::{AppError, AppResult, SmtpConfig};
use tracing::debug;

use crate::models::{BodyFormat, OutgoingMail};
use crate::traits::MailTransport;

/// Mail transport backed by `lettre::AsyncSmtpTransport`.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Create a transport for the configured relay.
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        let message = build_message(&mail)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Transport(format!("SMTP send failed: {e}")))?;

        debug!(to = %mail.to, language = %mail.language, "Sent mail via SMTP");
        Ok(())
    }
}

/// Render an [`OutgoingMail`] into a lettre message.
///
/// Addresses in the `Bcc` header become blind recipients of the envelope.
pub fn build_message(mail: &OutgoingMail) -> AppResult<lettre::Message> {
    let mut builder = lettre::Message::builder()
        .from(parse_mailbox(&mail.from)?)
        .to(parse_mailbox(&mail.to)?)
        .subject(mail.params.subject.as_str());

    if let Some(bcc) = mail.bcc() {
        for address in bcc.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            builder = builder.bcc(parse_mailbox(address)?);
        }
    }

    let content_type = match mail.params.body.format {
        BodyFormat::Html => ContentType::TEXT_HTML,
        BodyFormat::PlainText => ContentType::TEXT_PLAIN,
    };

    builder
        .header(content_type)
        .body(mail.params.body.value.clone())
        .map_err(|e| AppError::Transport(format!("Failed to build message: {e}")))
}

fn parse_mailbox(address: &str) -> AppResult<Mailbox> {
    address
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid address {address}: {e}")))
}
