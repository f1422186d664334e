use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::{GeoPoint, ValidationError};

/// A past calculation as stored by the history service. Never mutated client side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub straight_distance: f64,
    pub road_distance: f64,
    pub circuity_factor: f64,
    pub elapsed_ms: u64,
    pub units: String,
}

/// Flat row as served by `GET /history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: i64,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub origin_name: Option<String>,
    pub origin_lat: f64,
    pub origin_lng: f64,
    #[serde(default)]
    pub destination_name: Option<String>,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub straight_distance: f64,
    pub road_distance: f64,
    pub circuity_factor: f64,
    #[serde(default)]
    pub calculation_time_ms: u64,
    #[serde(default = "default_units")]
    pub units: String,
}

fn default_units() -> String {
    "miles".to_string()
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = ValidationError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            created_at: row.created_at,
            origin: GeoPoint::new(
                row.origin_lat,
                row.origin_lng,
                row.origin_name.unwrap_or_default(),
            )?,
            destination: GeoPoint::new(
                row.destination_lat,
                row.destination_lng,
                row.destination_name.unwrap_or_default(),
            )?,
            straight_distance: row.straight_distance,
            road_distance: row.road_distance,
            circuity_factor: row.circuity_factor,
            elapsed_ms: row.calculation_time_ms,
            units: row.units,
        })
    }
}

/// Accepts RFC 3339, naive ISO date-times (taken as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp `{raw}`")))
}

/// Query string of `GET /history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl HistoryQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            search: None,
            sort_by: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryRow>,
    pub total_count: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}
