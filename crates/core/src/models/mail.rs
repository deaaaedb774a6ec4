//! Outgoing mail handed to a transport.

use std::collections::BTreeMap;

use super::MessageBody;

/// Template key for every mass contact mail.
pub const MAIL_KEY: &str = "mass_contact";

/// Message parameters rendered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailParams {
    /// Subject line.
    pub subject: String,
    /// Body and its format.
    pub body: MessageBody,
    /// Extra headers, e.g. `Bcc`.
    pub headers: BTreeMap<String, String>,
}

/// A single transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Template key.
    pub key: &'static str,
    /// `To` address.
    pub to: String,
    /// `From` value.
    pub from: String,
    /// Language the mail is rendered in.
    pub language: String,
    /// Message parameters.
    pub params: MailParams,
}

impl OutgoingMail {
    /// Comma separated `Bcc` addresses, if any.
    #[must_use]
    pub fn bcc(&self) -> Option<&str> {
        self.params.headers.get("Bcc").map(String::as_str)
    }
}
