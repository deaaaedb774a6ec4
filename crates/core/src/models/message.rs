//! Mass contact messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CategoryId;

/// Archived message identifier.
pub type MessageId = String;

/// Format of a message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFormat {
    /// Plain text.
    #[default]
    PlainText,
    /// HTML markup.
    Html,
}

impl BodyFormat {
    /// Machine name used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Html => "html",
        }
    }

    /// Parse a stored machine name. Unknown names fall back to plain text.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "html" | "basic_html" | "full_html" => Self::Html,
            _ => Self::PlainText,
        }
    }
}

/// Message body with its format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Body text.
    pub value: String,
    /// Body format.
    #[serde(default)]
    pub format: BodyFormat,
}

impl MessageBody {
    /// Plain text body.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: BodyFormat::PlainText,
        }
    }

    /// HTML body.
    pub fn html(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: BodyFormat::Html,
        }
    }
}

/// A message addressed to one or more categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Set only once the message has been archived.
    pub id: Option<MessageId>,
    /// Subject line.
    pub subject: String,
    /// Body.
    pub body: MessageBody,
    /// Target categories.
    pub categories: Vec<CategoryId>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create an unarchived message.
    pub fn new(subject: impl Into<String>, body: MessageBody, categories: Vec<CategoryId>) -> Self {
        Self {
            id: None,
            subject: subject.into(),
            body,
            categories,
            created_at: Utc::now(),
        }
    }

    /// Copy of this message carrying its archive id.
    #[must_use]
    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_format_names() {
        assert_eq!(BodyFormat::from_name(BodyFormat::Html.as_str()), BodyFormat::Html);
        assert_eq!(BodyFormat::from_name("plain_text"), BodyFormat::PlainText);
        assert_eq!(BodyFormat::from_name("restricted"), BodyFormat::PlainText);
    }
}
