use std::collections::BTreeSet;

use super::domain::{CandidateProperty, PropertyId, ScoredRecommendation};
use super::interests::{InterestCategory, InterestProfile};

pub const DEFAULT_LIMIT: usize = 5;
pub const DEFAULT_MATCH_REASON: &str = "Matches your search criteria.";

const BASE_SCORE_WEIGHT: f64 = 0.5;
const MIN_MATCH_SCORE: f64 = 0.0;
const MAX_MATCH_SCORE: f64 = 100.0;

/// Score one candidate against the user's interest signature.
pub fn score_candidate(
    profile: &InterestProfile,
    candidate: CandidateProperty,
) -> ScoredRecommendation {
    let base = if candidate.base_score.is_finite() {
        candidate.base_score
    } else {
        0.0
    };
    let mut score = base * BASE_SCORE_WEIGHT;
    let mut reasons = Vec::new();

    for category in InterestCategory::ALL {
        if profile.contains(category) && category.matches(&candidate.attributes) {
            score += category.bonus();
            reasons.push(category.reason().to_string());
        }
    }

    let match_reason = if reasons.is_empty() {
        DEFAULT_MATCH_REASON.to_string()
    } else {
        reasons.join(", ")
    };

    ScoredRecommendation {
        property: candidate,
        match_score: score.clamp(MIN_MATCH_SCORE, MAX_MATCH_SCORE),
        match_reason,
        match_reasons: reasons,
    }
}

/// Score, rank, and truncate a page of candidates. Properties in `seen` are
/// dropped even when the catalog returned them.
pub fn rank_candidates(
    profile: &InterestProfile,
    candidates: Vec<CandidateProperty>,
    seen: &BTreeSet<PropertyId>,
    limit: usize,
) -> Vec<ScoredRecommendation> {
    let mut scored: Vec<ScoredRecommendation> = candidates
        .into_iter()
        .filter(|candidate| !seen.contains(&candidate.property_id))
        .map(|candidate| score_candidate(profile, candidate))
        .collect();

    scored.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    scored.truncate(limit);
    scored
}
