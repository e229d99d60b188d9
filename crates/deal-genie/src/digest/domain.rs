use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::personalization::UserId;

/// A user who opted into the weekly picks email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub user_id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Fully rendered message handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestSendStatus {
    Sent,
    Failed,
    Skipped,
}

/// One delivery attempt, persisted through the subscriber directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestSendRecord {
    pub user_id: UserId,
    pub email: String,
    pub status: DigestSendStatus,
    pub picks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl DigestSendRecord {
    fn attempt(subscriber: &Subscriber, status: DigestSendStatus, at: DateTime<Utc>) -> Self {
        Self {
            user_id: subscriber.user_id.clone(),
            email: subscriber.email.clone(),
            status,
            picks: 0,
            message_id: None,
            error: None,
            attempted_at: at,
        }
    }

    pub fn sent(
        subscriber: &Subscriber,
        picks: usize,
        message_id: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            picks,
            message_id: Some(message_id),
            ..Self::attempt(subscriber, DigestSendStatus::Sent, at)
        }
    }

    pub fn skipped(subscriber: &Subscriber, at: DateTime<Utc>) -> Self {
        Self::attempt(subscriber, DigestSendStatus::Skipped, at)
    }

    pub fn failed(
        subscriber: &Subscriber,
        picks: usize,
        error: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            picks,
            error: Some(error.into()),
            ..Self::attempt(subscriber, DigestSendStatus::Failed, at)
        }
    }
}

/// Totals returned by a digest run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestRunSummary {
    pub started_at: DateTime<Utc>,
    pub processed: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    pub records: Vec<DigestSendRecord>,
}

impl DigestRunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            processed: 0,
            sent: 0,
            skipped: 0,
            failed: 0,
            records: Vec::new(),
        }
    }

    pub fn tally(&mut self, record: DigestSendRecord) {
        self.processed += 1;
        match record.status {
            DigestSendStatus::Sent => self.sent += 1,
            DigestSendStatus::Skipped => self.skipped += 1,
            DigestSendStatus::Failed => self.failed += 1,
        }
        self.records.push(record);
    }
}
