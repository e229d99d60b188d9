use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::auth::AuthContext;
use super::domain::ScoredRecommendation;
use super::explanation::Explanation;
use super::ingest::{ActivityIngestor, UserHistory};
use super::interests::InterestProfile;
use super::preferences::{EffectivePreferences, PreferenceSignals};
use super::repository::{ActivityStore, CandidateQuery, PropertyCatalog, StoreError};
use super::scoring::rank_candidates;
use crate::config::PersonalizationConfig;

/// Ranked picks plus the explanation shown next to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub recommendations: Vec<ScoredRecommendation>,
    pub explanation: Explanation,
}

/// Request-scoped personalization pipeline: ingest, profile, query, score.
pub struct RecommendationService<S, C> {
    ingestor: ActivityIngestor<S>,
    catalog: Arc<C>,
    config: PersonalizationConfig,
}

impl<S, C> RecommendationService<S, C>
where
    S: ActivityStore + 'static,
    C: PropertyCatalog + 'static,
{
    pub fn new(activity: Arc<S>, catalog: Arc<C>, config: PersonalizationConfig) -> Self {
        let ingestor = ActivityIngestor::new(activity, config.activity_window);
        Self {
            ingestor,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &PersonalizationConfig {
        &self.config
    }

    /// Clamp a caller supplied limit into `1..=max_limit`.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        let max = self.config.max_limit.max(1);
        requested
            .unwrap_or(self.config.default_limit)
            .clamp(1, max)
    }

    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub async fn recommend(
        &self,
        context: &AuthContext,
        limit: Option<usize>,
    ) -> Result<RecommendationSet, RecommendationError> {
        let limit = self.effective_limit(limit);
        let history = self.ingestor.ingest(&context.user_id).await;
        self.recommend_from_history(&history, limit).await
    }

    /// Score against an already ingested history.
    pub async fn recommend_from_history(
        &self,
        history: &UserHistory,
        limit: usize,
    ) -> Result<RecommendationSet, RecommendationError> {
        let profile = InterestProfile::build(&history.activity, &history.feedback);
        let inferred = PreferenceSignals::derive(&history.activity, &history.feedback);
        let effective = EffectivePreferences::merge(&history.preferences, &inferred);
        let seen = history.seen_property_ids();

        let query = CandidateQuery {
            exclude: seen.clone(),
            zipcodes: effective.zipcodes.clone(),
            property_types: effective.property_types.clone(),
            min_bedrooms: effective.min_bedrooms,
            min_bathrooms: effective.min_bathrooms,
            max_price: effective.max_price,
            page_size: self.config.candidate_page_size.max(limit),
        };

        let mut candidates = self.catalog.candidates(&query).await?;
        if candidates.is_empty() && !query.zipcodes.is_empty() {
            warn!(
                zipcodes = ?query.zipcodes,
                "no candidates in preferred zipcodes; widening search"
            );
            candidates = self.catalog.candidates(&query.without_zipcodes()).await?;
        }
        let candidate_count = candidates.len();

        let recommendations = rank_candidates(&profile, candidates, &seen, limit);
        let explanation = Explanation::build(&profile, &inferred, &effective);

        info!(
            candidates = candidate_count,
            returned = recommendations.len(),
            top_categories = ?profile.top_categories(),
            "recommendations scored"
        );

        Ok(RecommendationSet {
            recommendations,
            explanation,
        })
    }
}

/// Failure that prevents producing any recommendations.
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("candidate lookup failed: {0}")]
    Catalog(#[from] StoreError),
}
