use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{ActivityRecord, FeedbackRecord, PropertyId, SearchPreferences};

const PREFERRED_ZIPCODE_COUNT: usize = 3;
const PREFERRED_TYPE_COUNT: usize = 2;

/// Location, type, and price preferences inferred from engagement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSignals {
    pub zipcodes: Vec<String>,
    pub property_types: Vec<String>,
    pub target_price: Option<u64>,
    #[serde(skip)]
    pub engagement: BTreeMap<PropertyId, i32>,
}

impl PreferenceSignals {
    pub fn derive(activity: &[ActivityRecord], feedback: &[FeedbackRecord]) -> Self {
        let mut engagement: BTreeMap<PropertyId, i32> = BTreeMap::new();
        let mut prices: BTreeMap<PropertyId, u64> = BTreeMap::new();
        let mut zipcodes: BTreeMap<String, i32> = BTreeMap::new();
        let mut property_types: BTreeMap<String, i32> = BTreeMap::new();

        for record in activity {
            let weight = record.activity_type.engagement_weight() as i32;
            *engagement.entry(record.property_id.clone()).or_default() += weight;
            if let Some(price) = record.details.price {
                prices.entry(record.property_id.clone()).or_insert(price);
            }
            if let Some(zipcode) = non_blank(record.details.zipcode.as_deref()) {
                *zipcodes.entry(zipcode.to_string()).or_default() += weight;
            }
            if let Some(kind) = non_blank(record.details.property_type.as_deref()) {
                *property_types.entry(kind.to_string()).or_default() += weight;
            }
        }

        for record in feedback {
            let adjustment = record.sentiment.adjustment();
            *engagement.entry(record.property_id.clone()).or_default() += adjustment;
            if let Some(price) = record.details.price {
                prices.entry(record.property_id.clone()).or_insert(price);
            }
            if let Some(zipcode) = non_blank(record.details.zipcode.as_deref()) {
                *zipcodes.entry(zipcode.to_string()).or_default() += adjustment;
            }
            if let Some(kind) = non_blank(record.details.property_type.as_deref()) {
                *property_types.entry(kind.to_string()).or_default() += adjustment;
            }
        }

        let engaged_prices: Vec<u64> = prices
            .iter()
            .filter(|(id, _)| engagement.get(*id).copied().unwrap_or_default() > 0)
            .map(|(_, price)| *price)
            .collect();

        Self {
            zipcodes: top_positive(zipcodes, PREFERRED_ZIPCODE_COUNT),
            property_types: top_positive(property_types, PREFERRED_TYPE_COUNT),
            target_price: median(engaged_prices),
            engagement,
        }
    }

    pub fn engagement_for(&self, property_id: &PropertyId) -> i32 {
        self.engagement.get(property_id).copied().unwrap_or_default()
    }
}

/// Inferred signals merged with the user's saved constraints. Saved values win.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePreferences {
    pub zipcodes: Vec<String>,
    pub property_types: Vec<String>,
    pub min_bedrooms: Option<u8>,
    pub min_bathrooms: Option<f32>,
    pub max_price: Option<u64>,
    pub target_price: Option<u64>,
}

impl EffectivePreferences {
    pub fn merge(saved: &SearchPreferences, inferred: &PreferenceSignals) -> Self {
        let zipcodes = if saved.zipcodes.is_empty() {
            inferred.zipcodes.clone()
        } else {
            saved.zipcodes.clone()
        };

        Self {
            zipcodes,
            property_types: saved.property_types.clone(),
            min_bedrooms: saved.min_bedrooms,
            min_bathrooms: saved.min_bathrooms,
            max_price: saved.max_price,
            target_price: inferred.target_price,
        }
    }

    /// Types to describe to the user: saved constraints, else inferred taste.
    pub fn described_types<'a>(&'a self, inferred: &'a PreferenceSignals) -> &'a [String] {
        if self.property_types.is_empty() {
            &inferred.property_types
        } else {
            &self.property_types
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn top_positive(weights: BTreeMap<String, i32>, count: usize) -> Vec<String> {
    let mut ranked: Vec<(String, i32)> = weights
        .into_iter()
        .filter(|(_, weight)| *weight > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(count).map(|(key, _)| key).collect()
}

pub(crate) fn median(mut values: Vec<u64>) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        let (lo, hi) = (values[mid - 1], values[mid]);
        Some(lo / 2 + hi / 2 + (lo % 2 + hi % 2) / 2)
    } else {
        Some(values[mid])
    }
}
