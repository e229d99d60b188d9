//! CSV imports used to seed catalog and activity data from exports.

use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use super::domain::{
    ActivityRecord, ActivityType, CandidateProperty, PropertyAttributeSnapshot, PropertyId, UserId,
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CandidateProperty>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CandidateProperty>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut properties = Vec::new();

        for (idx, row) in csv_reader.deserialize::<ExportRow>().enumerate() {
            let mut row = row?;
            let line = idx + 1;
            let property_id = required(row.property_id.take(), "property_id", line)?;
            properties.push(CandidateProperty {
                property_id: PropertyId(property_id),
                address: row.address.take().unwrap_or_default(),
                base_score: row.deal_score.unwrap_or_default(),
                attributes: row.into_snapshot(),
            });
        }

        Ok(properties)
    }
}

pub struct ActivityImporter;

impl ActivityImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<(UserId, ActivityRecord)>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<(UserId, ActivityRecord)>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (idx, row) in csv_reader.deserialize::<ExportRow>().enumerate() {
            let mut row = row?;
            let line = idx + 1;
            let user_id = required(row.user_id.take(), "user_id", line)?;
            let property_id = required(row.property_id.take(), "property_id", line)?;
            let raw_type = required(row.activity_type.take(), "activity_type", line)?;
            let raw_timestamp = required(row.timestamp.take(), "timestamp", line)?;

            let activity_type =
                ActivityType::parse(&raw_type).ok_or_else(|| ImportError::InvalidRow {
                    row: line,
                    message: format!("unknown activity type '{raw_type}'"),
                })?;
            let timestamp = parse_timestamp(&raw_timestamp).ok_or_else(|| ImportError::InvalidRow {
                row: line,
                message: format!("unparsable timestamp '{raw_timestamp}'"),
            })?;

            records.push((
                UserId(user_id),
                ActivityRecord {
                    property_id: PropertyId(property_id),
                    activity_type,
                    details: row.into_snapshot(),
                    timestamp,
                },
            ));
        }

        Ok(records)
    }
}

fn required(value: Option<String>, column: &str, row: usize) -> Result<String, ImportError> {
    value.ok_or_else(|| ImportError::InvalidRow {
        row,
        message: format!("{column} is required"),
    })
}

/// Union of the catalog and activity export columns. Unknown columns are
/// ignored and absent ones stay `None`.
#[derive(Debug, Default, Deserialize)]
struct ExportRow {
    #[serde(default, deserialize_with = "cell")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    property_id: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    activity_type: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    timestamp: Option<String>,
    #[serde(default, deserialize_with = "cell")]
    address: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    deal_score: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    price_drop_percent: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    potential_roi: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    days_on_market: Option<f64>,
    #[serde(default, deserialize_with = "cell")]
    property_type: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    bedrooms: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    bathrooms: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    equity: Option<f64>,
    #[serde(default, deserialize_with = "optional_flag")]
    owner_occupied: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    distressed: Option<bool>,
    #[serde(default, deserialize_with = "cell")]
    zipcode: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    price: Option<f64>,
}

impl ExportRow {
    fn into_snapshot(self) -> PropertyAttributeSnapshot {
        PropertyAttributeSnapshot {
            price_drop_percent: self.price_drop_percent,
            potential_roi: self.potential_roi,
            days_on_market: self.days_on_market.map(|days| days.max(0.0) as u32),
            property_type: self.property_type,
            bedrooms: self.bedrooms.map(|beds| beds.clamp(0.0, u8::MAX as f64) as u8),
            bathrooms: self.bathrooms.map(|baths| baths as f32),
            equity: self.equity,
            owner_occupied: self.owner_occupied,
            distressed: self.distressed,
            zipcode: self.zipcode,
            price: self.price.map(|price| price.max(0.0).round() as u64),
        }
    }
}

/// Reads a cell as raw text so values like zipcode `02134` keep their
/// leading zeros. Blank cells become `None`.
struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a CSV cell")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        let trimmed = value.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        self.visit_str(&value)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_string(CellVisitor)
    }
}

fn cell<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_string(CellVisitor)
}

fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match cell(deserializer)? {
        Some(raw) => raw
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("'{raw}' is not a number"))),
        None => Ok(None),
    }
}

fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match cell(deserializer)? {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(Some(true)),
            "false" | "no" | "n" | "0" => Ok(Some(false)),
            other => Err(de::Error::custom(format!("'{other}' is not a yes/no flag"))),
        },
        None => Ok(None),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn catalog_rows_keep_blank_cells_absent() {
        let csv = "property_id,address,deal_score,price,zipcode,property_type,bedrooms,bathrooms,price_drop_percent,potential_roi,days_on_market,equity,owner_occupied,distressed\n\
p-100,12 Elm St,72,\"$245,000\",50309,Single Family,3,2,8.5,,4,,no,\n";

        let properties = CatalogImporter::from_reader(Cursor::new(csv)).expect("catalog parses");

        assert_eq!(properties.len(), 1);
        let property = &properties[0];
        assert_eq!(property.base_score, 72.0);
        assert_eq!(property.attributes.price, Some(245_000));
        assert_eq!(property.attributes.bedrooms, Some(3));
        assert_eq!(property.attributes.price_drop_percent, Some(8.5));
        assert_eq!(property.attributes.potential_roi, None);
        assert_eq!(property.attributes.owner_occupied, Some(false));
        assert_eq!(property.attributes.distressed, None);
    }

    #[test]
    fn activity_rows_parse_dates_and_types() {
        let csv = "user_id,property_id,activity_type,timestamp,price_drop_percent\n\
u-1,p-1,view,2025-06-01T12:00:00Z,10\n\
u-1,p-2,Offer,2025-06-02,\n";

        let records = ActivityImporter::from_reader(Cursor::new(csv)).expect("activity parses");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, UserId("u-1".to_string()));
        assert_eq!(records[0].1.details.price_drop_percent, Some(10.0));
        assert_eq!(records[1].1.activity_type, ActivityType::Offer);
        assert_eq!(
            records[1].1.timestamp.date_naive(),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
    }

    #[test]
    fn zipcodes_keep_leading_zeros_and_missing_ids_are_rejected() {
        let csv = "property_id,address,deal_score,zipcode\np-1,1 Beacon St,88,02134\n,2 Beacon St,70,02134\n";

        match CatalogImporter::from_reader(Cursor::new(csv)) {
            Err(ImportError::InvalidRow { row, message }) => {
                assert_eq!(row, 2);
                assert_eq!(message, "property_id is required");
            }
            other => panic!("expected invalid row, got {other:?}"),
        }

        let csv = "property_id,address,deal_score,zipcode\np-1,1 Beacon St,88,02134\n";
        let properties = CatalogImporter::from_reader(Cursor::new(csv)).expect("catalog parses");
        assert_eq!(properties[0].attributes.zipcode.as_deref(), Some("02134"));
    }

    #[test]
    fn unknown_activity_type_reports_row() {
        let csv = "user_id,property_id,activity_type,timestamp\nu-1,p-1,share,2025-06-01\n";

        match ActivityImporter::from_reader(Cursor::new(csv)) {
            Err(ImportError::InvalidRow { row, message }) => {
                assert_eq!(row, 1);
                assert!(message.contains("share"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        match CatalogImporter::from_path("./does-not-exist.csv") {
            Err(ImportError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
