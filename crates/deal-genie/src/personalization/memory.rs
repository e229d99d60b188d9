//! In-memory collaborators for the demo server, the CLI and tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::auth::{AuthContext, AuthError, SessionResolver};
use super::domain::{
    ActivityRecord, CandidateProperty, FeedbackRecord, PropertyId, SearchPreferences, UserId,
};
use super::repository::{ActivityStore, CandidateQuery, PropertyCatalog, StoreError};
use crate::digest::{
    DigestEmail, DigestMailer, DigestSendRecord, MailerError, Subscriber, SubscriberDirectory,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable(format!("{name} lock poisoned")))
}

#[derive(Debug, Clone, Default)]
struct UserRecords {
    activity: Vec<ActivityRecord>,
    feedback: Vec<FeedbackRecord>,
    saved: Vec<PropertyId>,
    preferences: SearchPreferences,
}

#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    users: Mutex<HashMap<UserId, UserRecords>>,
}

impl InMemoryActivityStore {
    fn with_user<F>(&self, user_id: &UserId, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut UserRecords),
    {
        let mut users = lock(&self.users, "activity store")?;
        update(users.entry(user_id.clone()).or_default());
        Ok(())
    }

    pub fn record_activity(
        &self,
        user_id: &UserId,
        record: ActivityRecord,
    ) -> Result<(), StoreError> {
        self.with_user(user_id, |user| user.activity.push(record))
    }

    pub fn record_feedback(
        &self,
        user_id: &UserId,
        record: FeedbackRecord,
    ) -> Result<(), StoreError> {
        self.with_user(user_id, |user| user.feedback.push(record))
    }

    pub fn save_property(&self, user_id: &UserId, property_id: PropertyId) -> Result<(), StoreError> {
        self.with_user(user_id, |user| {
            if !user.saved.contains(&property_id) {
                user.saved.push(property_id);
            }
        })
    }

    pub fn set_preferences(
        &self,
        user_id: &UserId,
        preferences: SearchPreferences,
    ) -> Result<(), StoreError> {
        self.with_user(user_id, |user| user.preferences = preferences)
    }

    /// Load imported `(user, activity)` rows.
    pub fn extend_activity<I>(&self, rows: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = (UserId, ActivityRecord)>,
    {
        let mut users = lock(&self.users, "activity store")?;
        let mut loaded = 0;
        for (user_id, record) in rows {
            users.entry(user_id).or_default().activity.push(record);
            loaded += 1;
        }
        Ok(loaded)
    }

    fn snapshot(&self, user_id: &UserId) -> Result<UserRecords, StoreError> {
        let users = lock(&self.users, "activity store")?;
        Ok(users.get(user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn recent_activity(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        let mut activity = self.snapshot(user_id)?.activity;
        activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activity.truncate(limit);
        Ok(activity)
    }

    async fn recent_feedback(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut feedback = self.snapshot(user_id)?.feedback;
        feedback.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        feedback.truncate(limit);
        Ok(feedback)
    }

    async fn saved_property_ids(&self, user_id: &UserId) -> Result<Vec<PropertyId>, StoreError> {
        Ok(self.snapshot(user_id)?.saved)
    }

    async fn search_preferences(
        &self,
        user_id: &UserId,
    ) -> Result<SearchPreferences, StoreError> {
        Ok(self.snapshot(user_id)?.preferences)
    }
}

/// Catalog served best deal score first, ties broken by property id.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    properties: Mutex<Vec<CandidateProperty>>,
}

impl InMemoryCatalog {
    pub fn new(properties: Vec<CandidateProperty>) -> Self {
        Self {
            properties: Mutex::new(properties),
        }
    }

    pub fn insert(&self, property: CandidateProperty) -> Result<(), StoreError> {
        lock(&self.properties, "catalog")?.push(property);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.properties.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PropertyCatalog for InMemoryCatalog {
    async fn candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateProperty>, StoreError> {
        let properties = lock(&self.properties, "catalog")?;
        let mut matches: Vec<CandidateProperty> = properties
            .iter()
            .filter(|candidate| query.admits(candidate))
            .cloned()
            .collect();
        drop(properties);

        matches.sort_by(|a, b| {
            b.base_score
                .total_cmp(&a.base_score)
                .then_with(|| a.property_id.cmp(&b.property_id))
        });
        matches.truncate(query.page_size);
        Ok(matches)
    }
}

/// Token to session lookup standing in for the hosted auth provider.
#[derive(Debug, Default)]
pub struct InMemorySessions {
    sessions: Mutex<HashMap<String, AuthContext>>,
}

impl InMemorySessions {
    pub fn insert(&self, token: impl Into<String>, context: AuthContext) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(token.into(), context);
        }
    }

    pub fn with_session(self, token: impl Into<String>, context: AuthContext) -> Self {
        self.insert(token, context);
        self
    }
}

impl SessionResolver for InMemorySessions {
    fn resolve(&self, token: &str) -> Result<AuthContext, AuthError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| AuthError::InvalidSession)?;
        sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidSession)
    }
}

#[derive(Debug, Default)]
pub struct InMemorySubscribers {
    subscribers: Mutex<Vec<Subscriber>>,
    sends: Mutex<Vec<DigestSendRecord>>,
}

impl InMemorySubscribers {
    pub fn new(subscribers: Vec<Subscriber>) -> Self {
        Self {
            subscribers: Mutex::new(subscribers),
            sends: Mutex::default(),
        }
    }

    pub fn add(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        lock(&self.subscribers, "subscriber directory")?.push(subscriber);
        Ok(())
    }

    pub fn sends(&self) -> Vec<DigestSendRecord> {
        self.sends
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SubscriberDirectory for InMemorySubscribers {
    async fn subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(lock(&self.subscribers, "subscriber directory")?.clone())
    }

    async fn record_send(&self, record: DigestSendRecord) -> Result<(), StoreError> {
        lock(&self.sends, "send log")?.push(record);
        Ok(())
    }
}

/// Mailer that keeps every accepted message and can reject chosen recipients.
#[derive(Debug, Default)]
pub struct InMemoryMailer {
    outbox: Mutex<Vec<DigestEmail>>,
    rejected: Mutex<BTreeSet<String>>,
}

impl InMemoryMailer {
    pub fn reject(&self, recipient: impl Into<String>) {
        if let Ok(mut rejected) = self.rejected.lock() {
            rejected.insert(recipient.into());
        }
    }

    pub fn outbox(&self) -> Vec<DigestEmail> {
        self.outbox
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DigestMailer for InMemoryMailer {
    async fn send(&self, email: &DigestEmail) -> Result<String, MailerError> {
        if self.rejected.lock().map_err(mailer_poisoned)?.contains(&email.to) {
            return Err(MailerError::Rejected {
                recipient: email.to.clone(),
                reason: "mailbox unavailable".to_string(),
            });
        }

        let mut outbox = self.outbox.lock().map_err(mailer_poisoned)?;
        outbox.push(email.clone());
        Ok(format!("msg-{}", outbox.len()))
    }
}

fn mailer_poisoned<T>(_: T) -> MailerError {
    MailerError::Unavailable("outbox lock poisoned".to_string())
}
