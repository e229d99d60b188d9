use std::collections::BTreeMap;

use serde::Serialize;

use super::interests::{InterestCategory, InterestProfile};
use super::preferences::{EffectivePreferences, PreferenceSignals};

/// Preferences echoed back to the client alongside the picks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferencesView {
    pub top_categories: Vec<InterestCategory>,
    pub category_counts: BTreeMap<&'static str, i32>,
    pub zipcodes: Vec<String>,
    pub property_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bathrooms: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub user_preferences: UserPreferencesView,
    pub reasoning_text: String,
}

impl Explanation {
    pub fn build(
        profile: &InterestProfile,
        inferred: &PreferenceSignals,
        effective: &EffectivePreferences,
    ) -> Self {
        let property_types = effective.described_types(inferred).to_vec();

        let mut sentences = Vec::with_capacity(3);
        if let Some(sentence) = zipcode_sentence(&effective.zipcodes) {
            sentences.push(sentence);
        }
        sentences.push(layout_sentence(
            &property_types,
            effective.min_bedrooms,
            effective.min_bathrooms,
        ));
        sentences.push(price_sentence(effective.target_price, effective.max_price));

        Self {
            user_preferences: UserPreferencesView {
                top_categories: profile.top_categories().to_vec(),
                category_counts: profile.counters_by_key(),
                zipcodes: effective.zipcodes.clone(),
                property_types,
                min_bedrooms: effective.min_bedrooms,
                min_bathrooms: effective.min_bathrooms,
                max_price: effective.max_price,
                target_price: effective.target_price,
            },
            reasoning_text: sentences.join(" "),
        }
    }
}

fn zipcode_sentence(zipcodes: &[String]) -> Option<String> {
    if zipcodes.is_empty() {
        return None;
    }
    Some(format!(
        "You've been focusing on properties in {}.",
        join_with_and(zipcodes)
    ))
}

fn layout_sentence(
    property_types: &[String],
    min_bedrooms: Option<u8>,
    min_bathrooms: Option<f32>,
) -> String {
    let kinds = if property_types.is_empty() {
        "all property types".to_string()
    } else {
        format!("{} properties", join_with_and(property_types))
    };

    match (min_bedrooms, min_bathrooms) {
        (Some(beds), Some(baths)) => format!(
            "We prioritized {kinds} with at least {beds} bedrooms and {} bathrooms.",
            trim_decimal(baths)
        ),
        (Some(beds), None) => {
            format!("We prioritized {kinds} with at least {beds} bedrooms.")
        }
        (None, Some(baths)) => format!(
            "We prioritized {kinds} with at least {} bathrooms.",
            trim_decimal(baths)
        ),
        (None, None) => format!("We prioritized {kinds} of any size."),
    }
}

fn price_sentence(target_price: Option<u64>, max_price: Option<u64>) -> String {
    match (target_price, max_price) {
        (Some(target), _) => format!(
            "Your target price is around {} based on the homes you engage with most.",
            format_currency(target)
        ),
        (None, Some(max)) => format!(
            "Every pick stays within your {} budget.",
            format_currency(max)
        ),
        (None, None) => "We searched across all price ranges.".to_string(),
    }
}

fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

fn trim_decimal(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

pub(crate) fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}
