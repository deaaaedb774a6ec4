//! Recipients, recipient sets and batches.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Recipient (user account) identifier.
pub type RecipientId = String;

/// Deduplicated recipient ids in a deterministic order.
pub type RecipientSet = BTreeSet<RecipientId>;

/// Opt-out attribute value meaning "still subscribed".
pub const OPT_OUT_NONE: &str = "0";

/// Opt-out attribute value meaning "opted out of everything".
pub const OPT_OUT_ALL: &str = "1";

/// What the dispatcher needs to know about a recipient at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientRecord {
    /// Mail address.
    pub email: String,
    /// Preferred language code.
    pub language: String,
    /// Inactive (blocked) accounts never receive mail.
    pub active: bool,
}

/// Which opt-out attribute values exclude a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptOutCriteria {
    /// Any value other than the default.
    AnyValue,
    /// One of the listed values.
    OneOf(BTreeSet<String>),
}

impl OptOutCriteria {
    /// Whether a recipient with this opt-out attribute is excluded.
    ///
    /// Unset counts as the default value.
    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Self::AnyValue, Some(v)) => !v.is_empty() && v != OPT_OUT_NONE,
            (Self::OneOf(values), Some(v)) => values.contains(v),
        }
    }
}

/// An ordered, bounded group of recipients delivered together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch(Vec<RecipientId>);

impl Batch {
    /// Number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over recipient ids.
    pub fn iter(&self) -> std::slice::Iter<'_, RecipientId> {
        self.0.iter()
    }

    /// Recipient ids as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[RecipientId] {
        &self.0
    }
}

impl From<Vec<RecipientId>> for Batch {
    fn from(recipients: Vec<RecipientId>) -> Self {
        Self(recipients)
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a RecipientId;
    type IntoIter = std::slice::Iter<'a, RecipientId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
