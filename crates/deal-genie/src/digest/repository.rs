use async_trait::async_trait;

use super::domain::{DigestEmail, DigestSendRecord, Subscriber};
use crate::personalization::StoreError;

/// Source of digest subscribers and sink for send records.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    async fn subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;

    async fn record_send(&self, record: DigestSendRecord) -> Result<(), StoreError>;
}

/// Outbound email provider. Returns the provider's message id.
#[async_trait]
pub trait DigestMailer: Send + Sync {
    async fn send(&self, email: &DigestEmail) -> Result<String, MailerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailerError {
    #[error("message rejected for {recipient}: {reason}")]
    Rejected { recipient: String, reason: String },
    #[error("mail provider unavailable: {0}")]
    Unavailable(String),
}
