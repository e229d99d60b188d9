use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::PersonalizationConfig;
use crate::personalization::{
    ActivityRecord, ActivityStore, ActivityType, AuthContext, CandidateProperty, CandidateQuery,
    FeedbackRecord, InMemorySessions, PropertyAttributeSnapshot, PropertyCatalog, PropertyId,
    RecommendationService, SearchPreferences, SessionResolver, StoreError, UserId,
};

pub(super) const TOKEN: &str = "token-1";

pub(super) fn user() -> UserId {
    UserId("u-1".to_string())
}

pub(super) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn view(id: &str, details: PropertyAttributeSnapshot, day: u32) -> ActivityRecord {
    ActivityRecord {
        property_id: PropertyId(id.to_string()),
        activity_type: ActivityType::View,
        details,
        timestamp: at(day),
    }
}

pub(super) fn price_drop_snapshot() -> PropertyAttributeSnapshot {
    PropertyAttributeSnapshot {
        price_drop_percent: Some(10.0),
        potential_roi: Some(5.0),
        ..Default::default()
    }
}

pub(super) fn candidate(
    id: &str,
    base_score: f64,
    attributes: PropertyAttributeSnapshot,
) -> CandidateProperty {
    CandidateProperty {
        property_id: PropertyId(id.to_string()),
        address: format!("{id} Grand Ave"),
        base_score,
        attributes,
    }
}

pub(super) fn service_with<S, C>(store: Arc<S>, catalog: Arc<C>) -> RecommendationService<S, C>
where
    S: ActivityStore + 'static,
    C: PropertyCatalog + 'static,
{
    RecommendationService::new(store, catalog, PersonalizationConfig::default())
}

pub(super) fn sessions() -> Arc<dyn SessionResolver> {
    Arc::new(InMemorySessions::default().with_session(TOKEN, AuthContext::new("u-1")))
}

pub(super) struct UnavailableStore;

#[async_trait]
impl ActivityStore for UnavailableStore {
    async fn recent_activity(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn recent_feedback(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn saved_property_ids(&self, _user_id: &UserId) -> Result<Vec<PropertyId>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn search_preferences(
        &self,
        _user_id: &UserId,
    ) -> Result<SearchPreferences, StoreError> {
        Err(StoreError::Malformed("preferences column unreadable".to_string()))
    }
}

pub(super) struct UnavailableCatalog;

#[async_trait]
impl PropertyCatalog for UnavailableCatalog {
    async fn candidates(
        &self,
        _query: &CandidateQuery,
    ) -> Result<Vec<CandidateProperty>, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }
}

/// Returns the same rows for every query and remembers what was asked.
#[derive(Default)]
pub(super) struct StaticCatalog {
    rows: Vec<CandidateProperty>,
    queries: Mutex<Vec<CandidateQuery>>,
}

impl StaticCatalog {
    pub(super) fn new(rows: Vec<CandidateProperty>) -> Self {
        Self {
            rows,
            queries: Mutex::default(),
        }
    }

    pub(super) fn queries(&self) -> Vec<CandidateQuery> {
        self.queries.lock().expect("query log poisoned").clone()
    }
}

#[async_trait]
impl PropertyCatalog for StaticCatalog {
    async fn candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateProperty>, StoreError> {
        self.queries
            .lock()
            .expect("query log poisoned")
            .push(query.clone());
        Ok(self.rows.clone())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
