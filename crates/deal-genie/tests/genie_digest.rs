use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{TimeZone, Utc};
use deal_genie::config::{DigestConfig, PersonalizationConfig};
use deal_genie::digest::{
    digest_router, DigestError, DigestSendRecord, DigestSendStatus, GenieDigestJob, Subscriber,
    SubscriberDirectory,
};
use deal_genie::personalization::{
    ActivityRecord, ActivityType, CandidateProperty, InMemoryActivityStore, InMemoryCatalog,
    InMemoryMailer, InMemorySubscribers, PropertyAttributeSnapshot, PropertyId,
    RecommendationService, StoreError, UserId,
};
use tower::ServiceExt;

type Job<D> = GenieDigestJob<InMemoryActivityStore, InMemoryCatalog, D, InMemoryMailer>;

fn subscriber(id: &str, email: &str) -> Subscriber {
    Subscriber {
        user_id: UserId(id.to_string()),
        email: email.to_string(),
        first_name: Some(id.to_uppercase()),
    }
}

fn property(id: &str, score: f64) -> CandidateProperty {
    CandidateProperty {
        property_id: PropertyId(id.to_string()),
        address: format!("{id} Ingersoll Ave"),
        base_score: score,
        attributes: PropertyAttributeSnapshot {
            price: Some(180_000),
            ..Default::default()
        },
    }
}

fn viewed(store: &InMemoryActivityStore, user: &str, property: &str) {
    store
        .record_activity(
            &UserId(user.to_string()),
            ActivityRecord {
                property_id: PropertyId(property.to_string()),
                activity_type: ActivityType::View,
                details: PropertyAttributeSnapshot::default(),
                timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            },
        )
        .unwrap();
}

fn service() -> Arc<RecommendationService<InMemoryActivityStore, InMemoryCatalog>> {
    let store = Arc::new(InMemoryActivityStore::default());
    viewed(&store, "u-3", "c-1");
    viewed(&store, "u-3", "c-2");
    let catalog = Arc::new(InMemoryCatalog::new(vec![
        property("c-1", 80.0),
        property("c-2", 60.0),
    ]));
    Arc::new(RecommendationService::new(
        store,
        catalog,
        PersonalizationConfig::default(),
    ))
}

fn job_with(
    directory: Arc<InMemorySubscribers>,
    mailer: Arc<InMemoryMailer>,
    config: DigestConfig,
) -> Job<InMemorySubscribers> {
    GenieDigestJob::new(service(), directory, mailer, config)
}

fn directory() -> Arc<InMemorySubscribers> {
    Arc::new(InMemorySubscribers::new(vec![
        subscriber("u-1", "one@example.com"),
        subscriber("u-2", "bounce@example.com"),
        subscriber("u-3", "three@example.com"),
    ]))
}

#[tokio::test]
async fn one_failing_recipient_does_not_stop_the_batch() {
    let directory = directory();
    let mailer = Arc::new(InMemoryMailer::default());
    mailer.reject("bounce@example.com");
    let job = job_with(directory.clone(), mailer.clone(), DigestConfig::default());

    let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
    let summary = job.run(now).await.expect("run completes");

    assert_eq!(summary.processed, 3);
    assert_eq!((summary.sent, summary.failed, summary.skipped), (1, 1, 1));

    let statuses: Vec<DigestSendStatus> = summary.records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            DigestSendStatus::Sent,
            DigestSendStatus::Failed,
            DigestSendStatus::Skipped
        ]
    );
    assert_eq!(summary.records[0].picks, 2);
    assert_eq!(summary.records[0].message_id.as_deref(), Some("msg-1"));
    assert!(summary.records[1]
        .error
        .as_deref()
        .is_some_and(|err| err.contains("bounce@example.com")));

    let outbox = mailer.outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, "one@example.com");
    assert_eq!(
        outbox[0].subject,
        "Your Genie Picks: 2 new deals for the week of Jun 2, 2025"
    );
    assert!(outbox[0].html_body.contains("c-1 Ingersoll Ave"));

    assert_eq!(directory.sends(), summary.records);
}

#[tokio::test]
async fn picks_per_email_bounds_each_digest() {
    let mailer = Arc::new(InMemoryMailer::default());
    let config = DigestConfig {
        picks_per_email: 1,
        ..DigestConfig::default()
    };
    let job = job_with(
        Arc::new(InMemorySubscribers::new(vec![subscriber("u-1", "one@example.com")])),
        mailer.clone(),
        config,
    );

    let summary = job.run(Utc::now()).await.expect("run completes");

    assert_eq!(summary.records[0].picks, 1);
    assert!(mailer.outbox()[0].text_body.contains("1. c-1 Ingersoll Ave"));
}

struct OfflineDirectory;

#[async_trait]
impl SubscriberDirectory for OfflineDirectory {
    async fn subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        Err(StoreError::Unavailable("directory offline".to_string()))
    }

    async fn record_send(&self, _record: DigestSendRecord) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::test]
async fn listing_failure_aborts_the_run() {
    let job: Job<OfflineDirectory> = GenieDigestJob::new(
        service(),
        Arc::new(OfflineDirectory),
        Arc::new(InMemoryMailer::default()),
        DigestConfig::default(),
    );

    match job.run(Utc::now()).await {
        Err(DigestError::Directory(StoreError::Unavailable(message))) => {
            assert_eq!(message, "directory offline");
        }
        other => panic!("expected directory failure, got {other:?}"),
    }
}

#[tokio::test]
async fn trigger_requires_shared_secret_when_configured() {
    let config = DigestConfig {
        shared_secret: Some("cron-secret".to_string()),
        ..DigestConfig::default()
    };
    let job = Arc::new(job_with(
        directory(),
        Arc::new(InMemoryMailer::default()),
        config,
    ));
    let router = digest_router(job);

    let denied = router
        .clone()
        .oneshot(
            Request::post("/api/emails/genie-picks")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(denied.into_body(), 64 * 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "digest trigger requires the shared secret");

    let near_miss = router
        .clone()
        .oneshot(
            Request::post("/api/emails/genie-picks")
                .header(header::AUTHORIZATION, "Bearer cron-secreT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(near_miss.status(), StatusCode::UNAUTHORIZED);

    let accepted = router
        .oneshot(
            Request::post("/api/emails/genie-picks")
                .header(header::AUTHORIZATION, "Bearer cron-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(accepted.into_body(), 64 * 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["summary"]["processed"], 3);
    assert_eq!(body["summary"]["sent"], 2);
    assert_eq!(body["summary"]["skipped"], 1);
}
