//! In-memory collaborators for tests.
//!
//! Enabled with the `test-utils` feature.

#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use masscontact_common::{AppError, AppResult, IdGenerator};

use crate::models::{
    Category, CategoryId, DeliveryOverrides, Message, MessageId, OptOutCriteria, OutgoingMail,
    ProviderConfig, RecipientId, RecipientRecord, RecipientSet,
};
use crate::traits::{
    ArchiveStore, CategoryStore, MailTransport, MessageQueue, RecipientDirectory,
    RecipientProvider,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
struct Entry {
    record: RecipientRecord,
    opt_out: Option<String>,
}

/// Recipient directory held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    entries: Mutex<BTreeMap<RecipientId, Entry>>,
    opt_out_queries: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active recipient mailed at `{id}@example.com`.
    pub fn insert_active(&self, id: &str, opt_out: Option<&str>) {
        self.insert(id, true, opt_out);
    }

    /// Add an inactive recipient.
    pub fn insert_inactive(&self, id: &str, opt_out: Option<&str>) {
        self.insert(id, false, opt_out);
    }

    fn insert(&self, id: &str, active: bool, opt_out: Option<&str>) {
        lock(&self.entries).insert(
            id.to_string(),
            Entry {
                record: RecipientRecord {
                    email: format!("{id}@example.com"),
                    language: "en".to_string(),
                    active,
                },
                opt_out: opt_out.map(str::to_string),
            },
        );
    }

    pub fn set_language(&self, id: &str, language: &str) {
        if let Some(entry) = lock(&self.entries).get_mut(id) {
            entry.record.language = language.to_string();
        }
    }

    pub fn set_email(&self, id: &str, email: &str) {
        if let Some(entry) = lock(&self.entries).get_mut(id) {
            entry.record.email = email.to_string();
        }
    }

    pub fn deactivate(&self, id: &str) {
        if let Some(entry) = lock(&self.entries).get_mut(id) {
            entry.record.active = false;
        }
    }

    pub fn remove(&self, id: &str) {
        lock(&self.entries).remove(id);
    }

    /// Number of `find_opted_out` calls so far.
    pub fn opt_out_queries(&self) -> usize {
        self.opt_out_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryDirectory {
    async fn load(&self, id: &RecipientId) -> AppResult<Option<RecipientRecord>> {
        Ok(lock(&self.entries).get(id).map(|e| e.record.clone()))
    }

    async fn find_opted_out(&self, criteria: &OptOutCriteria) -> AppResult<RecipientSet> {
        self.opt_out_queries.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.entries)
            .iter()
            .filter(|(_, e)| e.record.active && criteria.matches(e.opt_out.as_deref()))
            .map(|(id, _)| id.clone())
            .collect())
    }
}

/// Provider returning fixed groups of recipients.
#[derive(Debug)]
pub struct StaticProvider {
    id: String,
    groups: BTreeMap<String, RecipientSet>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            groups: BTreeMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Register the members of a sub-category.
    #[must_use]
    pub fn with_group<I, S>(mut self, name: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .insert(name.to_string(), members.into_iter().map(Into::into).collect());
        self
    }

    /// Number of `recipients` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipientProvider for StaticProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn recipients(&self, config: &ProviderConfig) -> AppResult<RecipientSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(config
            .categories
            .iter()
            .filter_map(|name| self.groups.get(name))
            .flatten()
            .cloned()
            .collect())
    }
}

/// Transport recording every successful send.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: Mutex<BTreeSet<String>>,
    attempts: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send addressed `To` this address.
    pub fn fail_for(&self, address: &str) {
        lock(&self.failing).insert(address.to_string());
    }

    /// Stop failing.
    pub fn recover(&self) {
        lock(&self.failing).clear();
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        lock(&self.sent).clone()
    }

    /// Number of send calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if lock(&self.failing).contains(&mail.to) {
            return Err(AppError::Transport(format!("Connection refused for {}", mail.to)));
        }
        lock(&self.sent).push(mail);
        Ok(())
    }
}

/// Archive held in memory.
#[derive(Debug, Default)]
pub struct InMemoryArchive {
    saved: Mutex<Vec<Message>>,
    failing: AtomicBool,
    id_gen: IdGenerator,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent save.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Archived copies, each carrying its id.
    pub fn saved(&self) -> Vec<Message> {
        lock(&self.saved).clone()
    }
}

#[async_trait]
impl ArchiveStore for InMemoryArchive {
    async fn save(&self, message: &Message) -> AppResult<MessageId> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Archive("archive unavailable".to_string()));
        }
        let id = self.id_gen.generate();
        lock(&self.saved).push(message.clone().with_id(id.clone()));
        Ok(id)
    }
}

/// Category store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCategoryStore {
    categories: BTreeMap<CategoryId, Category>,
}

impl InMemoryCategoryStore {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn load_many(&self, ids: &[CategoryId]) -> AppResult<Vec<Category>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.categories.get(id))
            .cloned()
            .collect())
    }

    async fn list_selectable(&self) -> AppResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(categories)
    }
}

/// Queue recording enqueued messages.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    messages: Mutex<Vec<(Message, DeliveryOverrides)>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Message, DeliveryOverrides)> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl MessageQueue for RecordingQueue {
    async fn enqueue_message(
        &self,
        message: Message,
        configuration: DeliveryOverrides,
    ) -> AppResult<()> {
        lock(&self.messages).push((message, configuration));
        Ok(())
    }
}
