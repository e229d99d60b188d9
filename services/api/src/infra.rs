use chrono::NaiveDate;
use deal_genie::error::AppError;
use deal_genie::digest::Subscriber;
use deal_genie::personalization::{
    ActivityImporter, ActivityRecord, AuthContext, CatalogImporter, InMemoryActivityStore,
    InMemoryCatalog, InMemoryMailer, InMemorySessions, InMemorySubscribers, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

use crate::demo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Optional CSV exports that replace the bundled demo dataset.
#[derive(Debug, Default, Clone)]
pub(crate) struct SeedSources {
    pub(crate) catalog_csv: Option<PathBuf>,
    pub(crate) activity_csv: Option<PathBuf>,
}

/// In-memory collaborators shared by the server and the CLI commands.
pub(crate) struct Collaborators {
    pub(crate) store: Arc<InMemoryActivityStore>,
    pub(crate) catalog: Arc<InMemoryCatalog>,
    pub(crate) sessions: Arc<InMemorySessions>,
    pub(crate) subscribers: Arc<InMemorySubscribers>,
    pub(crate) mailer: Arc<InMemoryMailer>,
}

impl Collaborators {
    pub(crate) fn seed(sources: &SeedSources) -> Result<Self, AppError> {
        let catalog = match &sources.catalog_csv {
            Some(path) => CatalogImporter::from_path(path)?,
            None => demo::catalog(),
        };
        let activity = match &sources.activity_csv {
            Some(path) => ActivityImporter::from_path(path)?,
            None => demo::activity(),
        };

        let subscribers = demo::subscribers();
        let sessions = register_sessions(&activity, &subscribers);

        let store = Arc::new(InMemoryActivityStore::default());
        let loaded = store.extend_activity(activity)?;
        if sources.activity_csv.is_none() {
            for (user_id, record) in demo::feedback() {
                store.record_feedback(&user_id, record)?;
            }
            for (user_id, preferences) in demo::saved_searches() {
                store.set_preferences(&user_id, preferences)?;
            }
        }

        info!(
            catalog = catalog.len(),
            activity = loaded,
            "seeded in-memory collaborators"
        );

        Ok(Self {
            store,
            catalog: Arc::new(InMemoryCatalog::new(catalog)),
            sessions: Arc::new(sessions),
            subscribers: Arc::new(InMemorySubscribers::new(subscribers)),
            mailer: Arc::new(InMemoryMailer::default()),
        })
    }
}

/// One session per known user: every user in the activity feed plus every subscriber.
/// Subscribers are registered last so their sessions carry an email.
fn register_sessions(
    activity: &[(UserId, ActivityRecord)],
    subscribers: &[Subscriber],
) -> InMemorySessions {
    let sessions = InMemorySessions::default();
    let users: BTreeSet<&UserId> = activity.iter().map(|(user_id, _)| user_id).collect();
    for user_id in users {
        sessions.insert(
            demo::token_for(user_id),
            AuthContext {
                user_id: user_id.clone(),
                email: None,
            },
        );
    }
    for subscriber in subscribers {
        sessions.insert(
            demo::token_for(&subscriber.user_id),
            AuthContext {
                user_id: subscriber.user_id.clone(),
                email: Some(subscriber.email.clone()),
            },
        );
    }
    sessions
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
