//! Behavioral interest categories and the per-request interest profile.
//!
//! A profile is rebuilt from scratch on every scoring pass: one pass over the
//! activity window increments category counters, explicit feedback nudges
//! them up or down, and the top three positive categories become the user's
//! interest signature.

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{ActivityRecord, FeedbackRecord, PropertyAttributeSnapshot};

/// Maximum number of categories kept in the interest signature.
pub const TOP_CATEGORY_COUNT: usize = 3;

const CATEGORY_COUNT: usize = 11;

const PRICE_DROP_THRESHOLD: f64 = 5.0;
const HIGH_ROI_THRESHOLD: f64 = 12.0;
const NEW_LISTING_MAX_DAYS: u32 = 7;
const HIGH_EQUITY_THRESHOLD: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum InterestCategory {
    #[serde(rename = "priceDrops")]
    PriceDrops,
    #[serde(rename = "highROI")]
    HighRoi,
    #[serde(rename = "newListings")]
    NewListings,
    #[serde(rename = "singleFamily")]
    SingleFamily,
    #[serde(rename = "multiFamily")]
    MultiFamily,
    #[serde(rename = "beds3Plus")]
    Beds3Plus,
    #[serde(rename = "beds2Minus")]
    Beds2Minus,
    #[serde(rename = "highEquity")]
    HighEquity,
    #[serde(rename = "ownerOccupied")]
    OwnerOccupied,
    #[serde(rename = "nonOwnerOccupied")]
    NonOwnerOccupied,
    #[serde(rename = "distressed")]
    Distressed,
}

impl InterestCategory {
    /// Declaration order; also the tie-break order for the signature.
    pub const ALL: [InterestCategory; CATEGORY_COUNT] = [
        InterestCategory::PriceDrops,
        InterestCategory::HighRoi,
        InterestCategory::NewListings,
        InterestCategory::SingleFamily,
        InterestCategory::MultiFamily,
        InterestCategory::Beds3Plus,
        InterestCategory::Beds2Minus,
        InterestCategory::HighEquity,
        InterestCategory::OwnerOccupied,
        InterestCategory::NonOwnerOccupied,
        InterestCategory::Distressed,
    ];

    pub fn key(self) -> &'static str {
        match self {
            InterestCategory::PriceDrops => "priceDrops",
            InterestCategory::HighRoi => "highROI",
            InterestCategory::NewListings => "newListings",
            InterestCategory::SingleFamily => "singleFamily",
            InterestCategory::MultiFamily => "multiFamily",
            InterestCategory::Beds3Plus => "beds3Plus",
            InterestCategory::Beds2Minus => "beds2Minus",
            InterestCategory::HighEquity => "highEquity",
            InterestCategory::OwnerOccupied => "ownerOccupied",
            InterestCategory::NonOwnerOccupied => "nonOwnerOccupied",
            InterestCategory::Distressed => "distressed",
        }
    }

    /// Points added to a candidate's match score when this category matches.
    pub fn bonus(self) -> f64 {
        match self {
            InterestCategory::PriceDrops
            | InterestCategory::HighRoi
            | InterestCategory::Distressed => 15.0,
            InterestCategory::HighEquity => 12.0,
            InterestCategory::NewListings
            | InterestCategory::SingleFamily
            | InterestCategory::MultiFamily => 10.0,
            InterestCategory::Beds3Plus
            | InterestCategory::Beds2Minus
            | InterestCategory::OwnerOccupied
            | InterestCategory::NonOwnerOccupied => 8.0,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            InterestCategory::PriceDrops => "Price recently dropped",
            InterestCategory::HighRoi => "High ROI potential",
            InterestCategory::NewListings => "New on market",
            InterestCategory::SingleFamily => "Single family home",
            InterestCategory::MultiFamily => "Multi-family property",
            InterestCategory::Beds3Plus => "3+ bedrooms",
            InterestCategory::Beds2Minus => "Efficient floor plan",
            InterestCategory::HighEquity => "High equity opportunity",
            InterestCategory::OwnerOccupied => "Owner occupied",
            InterestCategory::NonOwnerOccupied => "Investor-owned property",
            InterestCategory::Distressed => "Potential distressed opportunity",
        }
    }

    /// Whether the snapshot carries a positive signal for this category.
    pub fn matches(self, snapshot: &PropertyAttributeSnapshot) -> bool {
        match self {
            InterestCategory::PriceDrops => snapshot
                .price_drop_percent
                .is_some_and(|pct| pct > PRICE_DROP_THRESHOLD),
            InterestCategory::HighRoi => snapshot
                .potential_roi
                .is_some_and(|roi| roi > HIGH_ROI_THRESHOLD),
            InterestCategory::NewListings => snapshot
                .days_on_market
                .is_some_and(|days| days < NEW_LISTING_MAX_DAYS),
            InterestCategory::SingleFamily => {
                snapshot.property_type.as_deref() == Some("Single Family")
            }
            InterestCategory::MultiFamily => {
                snapshot.property_type.as_deref() == Some("Multi-Family")
            }
            InterestCategory::Beds3Plus => snapshot.bedrooms.is_some_and(|beds| beds >= 3),
            InterestCategory::Beds2Minus => snapshot.bedrooms.is_some_and(|beds| beds <= 2),
            InterestCategory::HighEquity => snapshot
                .equity
                .is_some_and(|equity| equity > HIGH_EQUITY_THRESHOLD),
            InterestCategory::OwnerOccupied => snapshot.owner_occupied == Some(true),
            InterestCategory::NonOwnerOccupied => snapshot.owner_occupied == Some(false),
            InterestCategory::Distressed => snapshot.distressed == Some(true),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed-size category counters plus the derived interest signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestProfile {
    counters: [i32; CATEGORY_COUNT],
    top: Vec<InterestCategory>,
}

impl InterestProfile {
    /// Build the profile from the activity window and any explicit feedback.
    pub fn build(activity: &[ActivityRecord], feedback: &[FeedbackRecord]) -> Self {
        let mut counters = [0i32; CATEGORY_COUNT];

        for record in activity {
            for category in InterestCategory::ALL {
                if category.matches(&record.details) {
                    counters[category.index()] += 1;
                }
            }
        }

        for record in feedback {
            let adjustment = record.sentiment.adjustment();
            for category in InterestCategory::ALL {
                if category.matches(&record.details) {
                    counters[category.index()] += adjustment;
                }
            }
        }

        Self::from_counters(counters)
    }

    fn from_counters(counters: [i32; CATEGORY_COUNT]) -> Self {
        let mut ranked: Vec<InterestCategory> = InterestCategory::ALL
            .into_iter()
            .filter(|category| counters[category.index()] > 0)
            .collect();
        // `sort_by` is stable, so equal counters keep declaration order.
        ranked.sort_by(|a, b| counters[b.index()].cmp(&counters[a.index()]));
        ranked.truncate(TOP_CATEGORY_COUNT);

        Self {
            counters,
            top: ranked,
        }
    }

    pub fn counter(&self, category: InterestCategory) -> i32 {
        self.counters[category.index()]
    }

    pub fn top_categories(&self) -> &[InterestCategory] {
        &self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }

    pub fn contains(&self, category: InterestCategory) -> bool {
        self.top.contains(&category)
    }

    /// Counter snapshot keyed by category name, for API payloads.
    pub fn counters_by_key(&self) -> BTreeMap<&'static str, i32> {
        InterestCategory::ALL
            .into_iter()
            .map(|category| (category.key(), self.counter(category)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personalization::domain::{ActivityType, FeedbackSentiment, PropertyId};
    use chrono::{TimeZone, Utc};

    fn view(details: PropertyAttributeSnapshot) -> ActivityRecord {
        ActivityRecord {
            property_id: PropertyId("p-1".to_string()),
            activity_type: ActivityType::View,
            details,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn thresholds_are_strict_where_documented() {
        let at_threshold = PropertyAttributeSnapshot {
            price_drop_percent: Some(5.0),
            potential_roi: Some(12.0),
            days_on_market: Some(7),
            equity: Some(100_000.0),
            ..Default::default()
        };
        for category in [
            InterestCategory::PriceDrops,
            InterestCategory::HighRoi,
            InterestCategory::NewListings,
            InterestCategory::HighEquity,
        ] {
            assert!(!category.matches(&at_threshold), "{category:?} matched");
        }

        let beds = |count| PropertyAttributeSnapshot {
            bedrooms: Some(count),
            ..Default::default()
        };
        assert!(InterestCategory::Beds3Plus.matches(&beds(3)));
        assert!(InterestCategory::Beds2Minus.matches(&beds(2)));
        assert!(!InterestCategory::Beds2Minus.matches(&beds(3)));
    }

    #[test]
    fn owner_occupancy_needs_an_explicit_flag() {
        let unknown = PropertyAttributeSnapshot::default();
        assert!(!InterestCategory::OwnerOccupied.matches(&unknown));
        assert!(!InterestCategory::NonOwnerOccupied.matches(&unknown));

        let investor = PropertyAttributeSnapshot {
            owner_occupied: Some(false),
            ..Default::default()
        };
        assert!(InterestCategory::NonOwnerOccupied.matches(&investor));
    }

    #[test]
    fn repeated_price_drop_views_dominate_signature() {
        let details = PropertyAttributeSnapshot {
            price_drop_percent: Some(10.0),
            potential_roi: Some(5.0),
            ..Default::default()
        };
        let activity = vec![view(details.clone()), view(details.clone()), view(details)];

        let profile = InterestProfile::build(&activity, &[]);

        assert_eq!(profile.counter(InterestCategory::PriceDrops), 3);
        assert_eq!(profile.counter(InterestCategory::HighRoi), 0);
        assert_eq!(profile.top_categories(), &[InterestCategory::PriceDrops]);
    }

    #[test]
    fn ties_fall_back_to_declaration_order() {
        let details = PropertyAttributeSnapshot {
            distressed: Some(true),
            bedrooms: Some(4),
            property_type: Some("Multi-Family".to_string()),
            potential_roi: Some(20.0),
            ..Default::default()
        };
        let profile = InterestProfile::build(&[view(details)], &[]);

        assert_eq!(
            profile.top_categories(),
            &[
                InterestCategory::HighRoi,
                InterestCategory::MultiFamily,
                InterestCategory::Beds3Plus,
            ]
        );
    }

    #[test]
    fn thumbs_down_can_suppress_a_dominant_category() {
        let drop = PropertyAttributeSnapshot {
            price_drop_percent: Some(9.0),
            ..Default::default()
        };
        let feedback: Vec<FeedbackRecord> = (0..2)
            .map(|_| FeedbackRecord {
                property_id: PropertyId("p-9".to_string()),
                sentiment: FeedbackSentiment::ThumbsDown,
                details: drop.clone(),
                timestamp: Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap(),
            })
            .collect();

        let profile = InterestProfile::build(&[view(drop.clone()), view(drop)], &feedback);

        assert_eq!(profile.counter(InterestCategory::PriceDrops), 0);
        assert!(profile.is_empty());
    }

    #[test]
    fn empty_history_yields_empty_signature() {
        let profile = InterestProfile::build(&[], &[]);
        assert!(profile.is_empty());
        assert_eq!(profile.counters_by_key().len(), InterestCategory::ALL.len());
    }
}
