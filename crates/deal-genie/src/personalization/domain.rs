use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an authenticated Deal Genie user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a property in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of interaction a user had with a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    View,
    Save,
    Feedback,
    Offer,
}

impl ActivityType {
    /// Engagement weight contributed by one interaction of this kind.
    pub fn engagement_weight(self) -> u32 {
        match self {
            ActivityType::View => 1,
            ActivityType::Save => 3,
            ActivityType::Feedback => 2,
            ActivityType::Offer => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActivityType::View => "view",
            ActivityType::Save => "save",
            ActivityType::Feedback => "feedback",
            ActivityType::Offer => "offer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "view" => Some(Self::View),
            "save" => Some(Self::Save),
            "feedback" => Some(Self::Feedback),
            "offer" => Some(Self::Offer),
            _ => None,
        }
    }
}

/// Attributes captured when the interaction happened. Every field is optional;
/// an absent field carries no signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAttributeSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_drop_percent: Option<f64>,
    #[serde(
        default,
        rename = "potentialROI",
        skip_serializing_if = "Option::is_none"
    )]
    pub potential_roi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_on_market: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_occupied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distressed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
}

/// One historical interaction, read-only from the personalization side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub property_id: PropertyId,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub details: PropertyAttributeSnapshot,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSentiment {
    ThumbsUp,
    ThumbsDown,
}

impl FeedbackSentiment {
    /// Adjustment applied to every preference the feedback touches.
    pub fn adjustment(self) -> i32 {
        match self {
            FeedbackSentiment::ThumbsUp => 2,
            FeedbackSentiment::ThumbsDown => -1,
        }
    }
}

/// Explicit thumbs-up/down left on a recommended property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub property_id: PropertyId,
    pub sentiment: FeedbackSentiment,
    #[serde(default)]
    pub details: PropertyAttributeSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// Hard constraints saved by the user on their search profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPreferences {
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub min_bedrooms: Option<u8>,
    #[serde(default)]
    pub min_bathrooms: Option<f32>,
    #[serde(default)]
    pub property_types: Vec<String>,
    #[serde(default)]
    pub zipcodes: Vec<String>,
}

/// Catalog row eligible for recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProperty {
    pub property_id: PropertyId,
    pub address: String,
    /// Externally computed deal score, expected in `0..=100`.
    pub base_score: f64,
    #[serde(default)]
    pub attributes: PropertyAttributeSnapshot,
}

/// Candidate ranked for a specific user. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecommendation {
    #[serde(flatten)]
    pub property: CandidateProperty,
    pub match_score: f64,
    pub match_reason: String,
    pub match_reasons: Vec<String>,
}
