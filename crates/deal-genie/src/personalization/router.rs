use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::auth::{authenticate, SessionResolver};
use super::domain::ScoredRecommendation;
use super::explanation::Explanation;
use super::repository::{ActivityStore, PropertyCatalog};
use super::service::{RecommendationService, RecommendationSet};
use crate::error::AppError;

/// Shared state for the recommendation endpoint.
pub struct RecommendationApi<S, C> {
    pub service: Arc<RecommendationService<S, C>>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl<S, C> Clone for RecommendationApi<S, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecommendationParams {
    #[serde(default)]
    pub(crate) limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub success: bool,
    pub recommendations: Vec<ScoredRecommendation>,
    pub explanation: Explanation,
}

impl From<RecommendationSet> for RecommendationResponse {
    fn from(set: RecommendationSet) -> Self {
        Self {
            success: true,
            recommendations: set.recommendations,
            explanation: set.explanation,
        }
    }
}

/// Router builder exposing the personalized recommendations endpoint.
pub fn recommendation_router<S, C>(
    service: Arc<RecommendationService<S, C>>,
    sessions: Arc<dyn SessionResolver>,
) -> Router
where
    S: ActivityStore + 'static,
    C: PropertyCatalog + 'static,
{
    Router::new()
        .route(
            "/api/recommendations",
            get(recommendations_handler::<S, C>),
        )
        .with_state(RecommendationApi { service, sessions })
}

pub(crate) async fn recommendations_handler<S, C>(
    State(api): State<RecommendationApi<S, C>>,
    headers: HeaderMap,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationResponse>, AppError>
where
    S: ActivityStore + 'static,
    C: PropertyCatalog + 'static,
{
    let context = authenticate(api.sessions.as_ref(), &headers)?;
    let limit = parse_limit(params.limit.as_deref())?;

    let set = api
        .service
        .recommend(&context, limit)
        .await
        .map_err(|err| {
            error!(user_id = %context.user_id, error = %err, "recommendation request failed");
            AppError::from(err)
        })?;
    Ok(Json(RecommendationResponse::from(set)))
}

fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<usize>().map(Some).map_err(|_| {
            AppError::InvalidRequest(format!(
                "limit must be a non-negative integer, got '{raw}'"
            ))
        }),
    }
}
