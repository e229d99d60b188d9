use crate::cli::ServeArgs;
use crate::infra::{AppState, Collaborators, SeedSources};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use deal_genie::config::AppConfig;
use deal_genie::digest::{digest_router, GenieDigestJob};
use deal_genie::error::AppError;
use deal_genie::personalization::{recommendation_router, RecommendationService};
use deal_genie::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let collaborators = Collaborators::seed(&SeedSources {
        catalog_csv: args.catalog_csv.take(),
        activity_csv: args.activity_csv.take(),
    })?;
    let recommendations = Arc::new(RecommendationService::new(
        collaborators.store,
        collaborators.catalog,
        config.personalization.clone(),
    ));
    let digest = Arc::new(GenieDigestJob::new(
        recommendations.clone(),
        collaborators.subscribers,
        collaborators.mailer,
        config.digest.clone(),
    ));

    let features = recommendation_router(recommendations, collaborators.sessions)
        .merge(digest_router(digest));
    let app = with_operational_routes(features)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "deal genie personalization service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
