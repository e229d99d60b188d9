use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::domain::{DigestRunSummary, DigestSendRecord, Subscriber};
use super::render::render_email;
use super::repository::{DigestMailer, SubscriberDirectory};
use crate::config::DigestConfig;
use crate::personalization::{
    ActivityStore, AuthContext, PropertyCatalog, RecommendationService, StoreError,
};

/// Batch driver for the weekly genie-picks email.
pub struct GenieDigestJob<S, C, D, M> {
    service: Arc<RecommendationService<S, C>>,
    directory: Arc<D>,
    mailer: Arc<M>,
    config: DigestConfig,
}

impl<S, C, D, M> GenieDigestJob<S, C, D, M>
where
    S: ActivityStore + 'static,
    C: PropertyCatalog + 'static,
    D: SubscriberDirectory + 'static,
    M: DigestMailer + 'static,
{
    pub fn new(
        service: Arc<RecommendationService<S, C>>,
        directory: Arc<D>,
        mailer: Arc<M>,
        config: DigestConfig,
    ) -> Self {
        Self {
            service,
            directory,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Process every subscriber once. Per-user failures end up in the
    /// summary; only a failed subscriber listing aborts the run.
    #[instrument(skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<DigestRunSummary, DigestError> {
        let subscribers = self.directory.subscribers().await?;
        info!(subscribers = subscribers.len(), "genie picks digest started");

        let mut summary = DigestRunSummary::new(now);
        for subscriber in &subscribers {
            let record = self.deliver(subscriber, now).await;
            if let Err(err) = self.directory.record_send(record.clone()).await {
                warn!(
                    user_id = %subscriber.user_id,
                    error = %err,
                    "failed to persist digest send record"
                );
            }
            summary.tally(record);
        }

        info!(
            processed = summary.processed,
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "genie picks digest finished"
        );
        Ok(summary)
    }

    async fn deliver(&self, subscriber: &Subscriber, now: DateTime<Utc>) -> DigestSendRecord {
        let context = AuthContext {
            user_id: subscriber.user_id.clone(),
            email: Some(subscriber.email.clone()),
        };

        let picks = match self
            .service
            .recommend(&context, Some(self.config.picks_per_email))
            .await
        {
            Ok(picks) => picks,
            Err(err) => {
                warn!(user_id = %subscriber.user_id, error = %err, "digest scoring failed");
                return DigestSendRecord::failed(subscriber, 0, err.to_string(), now);
            }
        };

        let count = picks.recommendations.len();
        if count == 0 {
            debug!(user_id = %subscriber.user_id, "no picks this week; skipping");
            return DigestSendRecord::skipped(subscriber, now);
        }

        let email = match render_email(subscriber, &picks, &self.config.sender, now) {
            Ok(email) => email,
            Err(err) => {
                return DigestSendRecord::failed(
                    subscriber,
                    count,
                    format!("render failed: {err}"),
                    now,
                )
            }
        };

        match self.mailer.send(&email).await {
            Ok(message_id) => {
                debug!(user_id = %subscriber.user_id, %message_id, picks = count, "digest sent");
                DigestSendRecord::sent(subscriber, count, message_id, now)
            }
            Err(err) => {
                warn!(user_id = %subscriber.user_id, error = %err, "digest delivery failed");
                DigestSendRecord::failed(subscriber, count, err.to_string(), now)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("could not list digest subscribers: {0}")]
    Directory(#[from] StoreError),
}
