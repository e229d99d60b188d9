use std::collections::BTreeSet;

use async_trait::async_trait;

use super::domain::{
    ActivityRecord, CandidateProperty, FeedbackRecord, PropertyId, SearchPreferences, UserId,
};

/// Read-only access to a user's interaction history.
///
/// Every method returns at most `limit` rows, most recent first.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn recent_activity(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ActivityRecord>, StoreError>;

    async fn recent_feedback(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<FeedbackRecord>, StoreError>;

    async fn saved_property_ids(&self, user_id: &UserId) -> Result<Vec<PropertyId>, StoreError>;

    async fn search_preferences(&self, user_id: &UserId)
        -> Result<SearchPreferences, StoreError>;
}

/// Property catalog queried for candidates with a precomputed deal score.
#[async_trait]
pub trait PropertyCatalog: Send + Sync {
    async fn candidates(&self, query: &CandidateQuery)
        -> Result<Vec<CandidateProperty>, StoreError>;
}

/// Server-side filters applied by the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateQuery {
    pub exclude: BTreeSet<PropertyId>,
    pub zipcodes: Vec<String>,
    pub property_types: Vec<String>,
    pub min_bedrooms: Option<u8>,
    pub min_bathrooms: Option<f32>,
    pub max_price: Option<u64>,
    pub page_size: usize,
}

impl CandidateQuery {
    /// Whether a candidate satisfies every hard filter in the query.
    pub fn admits(&self, candidate: &CandidateProperty) -> bool {
        if self.exclude.contains(&candidate.property_id) {
            return false;
        }

        let attributes = &candidate.attributes;
        if !self.zipcodes.is_empty() {
            match attributes.zipcode.as_deref() {
                Some(zipcode) if self.zipcodes.iter().any(|wanted| wanted == zipcode) => {}
                _ => return false,
            }
        }
        if !self.property_types.is_empty() {
            match attributes.property_type.as_deref() {
                Some(kind)
                    if self
                        .property_types
                        .iter()
                        .any(|wanted| wanted.eq_ignore_ascii_case(kind)) => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_bedrooms {
            if attributes.bedrooms.map_or(true, |beds| beds < min) {
                return false;
            }
        }
        if let Some(min) = self.min_bathrooms {
            if attributes.bathrooms.map_or(true, |baths| baths < min) {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if attributes.price.map_or(true, |price| price > max) {
                return false;
            }
        }

        true
    }

    /// Same query without the zipcode narrowing.
    pub fn without_zipcodes(&self) -> Self {
        Self {
            zipcodes: Vec::new(),
            ..self.clone()
        }
    }
}

/// Data-access failure at a store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personalization::domain::PropertyAttributeSnapshot;

    fn candidate(id: &str, attributes: PropertyAttributeSnapshot) -> CandidateProperty {
        CandidateProperty {
            property_id: PropertyId(id.to_string()),
            address: format!("{id} Main St"),
            base_score: 70.0,
            attributes,
        }
    }

    #[test]
    fn hard_filters_reject_missing_attributes() {
        let query = CandidateQuery {
            min_bedrooms: Some(3),
            max_price: Some(300_000),
            ..Default::default()
        };

        let unknown = candidate("p-1", PropertyAttributeSnapshot::default());
        assert!(!query.admits(&unknown));

        let fits = candidate(
            "p-2",
            PropertyAttributeSnapshot {
                bedrooms: Some(3),
                price: Some(250_000),
                ..Default::default()
            },
        );
        assert!(query.admits(&fits));
    }

    #[test]
    fn exclusion_and_zipcodes_are_enforced() {
        let mut query = CandidateQuery {
            zipcodes: vec!["50309".to_string()],
            ..Default::default()
        };
        query.exclude.insert(PropertyId("seen".to_string()));

        let attributes = PropertyAttributeSnapshot {
            zipcode: Some("50309".to_string()),
            ..Default::default()
        };
        assert!(!query.admits(&candidate("seen", attributes.clone())));
        assert!(query.admits(&candidate("fresh", attributes)));
        assert!(!query.admits(&candidate("elsewhere", PropertyAttributeSnapshot::default())));
        assert!(query
            .without_zipcodes()
            .admits(&candidate("elsewhere", PropertyAttributeSnapshot::default())));
    }
}
