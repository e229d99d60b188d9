use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use super::job::GenieDigestJob;
use super::repository::{DigestMailer, SubscriberDirectory};
use crate::error::AppError;
use crate::personalization::auth::require_secret;
use crate::personalization::{ActivityStore, PropertyCatalog};

/// Router exposing the batch trigger used by the weekly scheduler.
pub fn digest_router<S, C, D, M>(job: Arc<GenieDigestJob<S, C, D, M>>) -> Router
where
    S: ActivityStore + 'static,
    C: PropertyCatalog + 'static,
    D: SubscriberDirectory + 'static,
    M: DigestMailer + 'static,
{
    Router::new()
        .route(
            "/api/emails/genie-picks",
            post(genie_picks_handler::<S, C, D, M>),
        )
        .with_state(job)
}

pub(crate) async fn genie_picks_handler<S, C, D, M>(
    State(job): State<Arc<GenieDigestJob<S, C, D, M>>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError>
where
    S: ActivityStore + 'static,
    C: PropertyCatalog + 'static,
    D: SubscriberDirectory + 'static,
    M: DigestMailer + 'static,
{
    if let Some(secret) = job.config().shared_secret.as_deref() {
        require_secret(&headers, secret)?;
    }

    let summary = job.run(Utc::now()).await.map_err(|err| {
        error!(error = %err, "genie picks digest failed");
        AppError::from(err)
    })?;
    Ok(Json(json!({ "success": true, "summary": summary })))
}
