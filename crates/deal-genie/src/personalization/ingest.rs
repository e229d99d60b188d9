use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::{ActivityRecord, FeedbackRecord, PropertyId, SearchPreferences, UserId};
use super::repository::{ActivityStore, StoreError};

/// Everything known about a user's past behavior for one scoring pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserHistory {
    pub activity: Vec<ActivityRecord>,
    pub feedback: Vec<FeedbackRecord>,
    pub saved: BTreeSet<PropertyId>,
    pub preferences: SearchPreferences,
}

impl UserHistory {
    /// Properties the user already interacted with; never recommended again.
    pub fn seen_property_ids(&self) -> BTreeSet<PropertyId> {
        let mut seen = self.saved.clone();
        seen.extend(self.activity.iter().map(|record| record.property_id.clone()));
        seen.extend(self.feedback.iter().map(|record| record.property_id.clone()));
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_empty() && self.feedback.is_empty() && self.saved.is_empty()
    }
}

/// Reads the bounded activity window for a user.
pub struct ActivityIngestor<S> {
    store: Arc<S>,
    window: usize,
}

impl<S> ActivityIngestor<S>
where
    S: ActivityStore + 'static,
{
    pub fn new(store: Arc<S>, window: usize) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Issue the history reads concurrently. A failed read degrades to an
    /// empty slice so personalization falls back instead of failing.
    pub async fn ingest(&self, user_id: &UserId) -> UserHistory {
        let (activity, feedback, saved, preferences) = tokio::join!(
            self.store.recent_activity(user_id, self.window),
            self.store.recent_feedback(user_id, self.window),
            self.store.saved_property_ids(user_id),
            self.store.search_preferences(user_id),
        );

        let mut activity = or_empty(activity, user_id, "activity");
        activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activity.truncate(self.window);

        let mut feedback = or_empty(feedback, user_id, "feedback");
        feedback.truncate(self.window);

        let history = UserHistory {
            activity,
            feedback,
            saved: or_empty(saved, user_id, "saved properties")
                .into_iter()
                .collect(),
            preferences: or_empty(preferences, user_id, "search preferences"),
        };

        debug!(
            user_id = %user_id,
            activity = history.activity.len(),
            feedback = history.feedback.len(),
            saved = history.saved.len(),
            "user history ingested"
        );

        history
    }
}

fn or_empty<T: Default>(result: Result<T, StoreError>, user_id: &UserId, slice: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(user_id = %user_id, slice, error = %err, "history read failed; treating as empty");
            T::default()
        }
    }
}
