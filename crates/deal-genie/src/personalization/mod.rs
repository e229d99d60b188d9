//! Lead personalization: activity ingestion, interest profiling, candidate
//! scoring and the `/api/recommendations` endpoint.

pub mod auth;
pub mod domain;
pub mod explanation;
pub mod import;
pub mod ingest;
pub mod interests;
pub mod memory;
pub mod preferences;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use auth::{authenticate, AuthContext, AuthError, SessionResolver};
pub use domain::{
    ActivityRecord, ActivityType, CandidateProperty, FeedbackRecord, FeedbackSentiment,
    PropertyAttributeSnapshot, PropertyId, ScoredRecommendation, SearchPreferences, UserId,
};
pub use explanation::{Explanation, UserPreferencesView};
pub use import::{ActivityImporter, CatalogImporter, ImportError};
pub use ingest::{ActivityIngestor, UserHistory};
pub use interests::{InterestCategory, InterestProfile, TOP_CATEGORY_COUNT};
pub use memory::{
    InMemoryActivityStore, InMemoryCatalog, InMemoryMailer, InMemorySessions, InMemorySubscribers,
};
pub use preferences::{EffectivePreferences, PreferenceSignals};
pub use repository::{ActivityStore, CandidateQuery, PropertyCatalog, StoreError};
pub use router::{recommendation_router, RecommendationResponse};
pub use scoring::{rank_candidates, score_candidate, DEFAULT_LIMIT, DEFAULT_MATCH_REASON};
pub use service::{RecommendationError, RecommendationService, RecommendationSet};
