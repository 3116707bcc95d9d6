use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// A ride row as it comes out of either backend, before normalization.
///
/// Every field is optional or loosely typed: legacy CSV files and older
/// database rows may lack columns or carry garbage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRide {
    pub id: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub waypoint: Option<String>,
    pub end: Option<String>,
    pub weather: Option<String>,
    /// Distance as stored text ("12.5", "12,5", "", ...)
    pub distance_km: Option<String>,
    pub notes: Option<String>,
    pub rider: Option<String>,
    pub photo_urls: Vec<String>,
}

/// A row of the hosted `rides` table.
#[derive(Debug, Clone, FromRow)]
pub struct RideRow {
    pub id: i64,
    pub date: String,
    pub start_label: String,
    pub waypoint_label: Option<String>,
    pub end_label: String,
    pub weather_summary: Option<String>,
    pub distance_km: Decimal,
    pub notes: Option<String>,
    pub rider: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

impl From<RideRow> for RawRide {
    fn from(row: RideRow) -> Self {
        Self {
            id: Some(row.id.to_string()),
            date: Some(row.date),
            start: Some(row.start_label),
            waypoint: row.waypoint_label,
            end: Some(row.end_label),
            weather: row.weather_summary,
            distance_km: Some(row.distance_km.to_string()),
            notes: row.notes,
            rider: row.rider,
            photo_urls: row.photo_urls.unwrap_or_default(),
        }
    }
}

/// A validated ride ready to be appended to a backend.
///
/// Only stored columns live here; derived values (parsed dates, ride time)
/// are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRide {
    /// Date in the stored `%d/%m/%Y` format
    pub date: String,
    pub start_label: String,
    pub waypoint_label: Option<String>,
    pub end_label: String,
    pub weather_summary: Option<String>,
    pub distance_km: f64,
    pub notes: Option<String>,
    /// Canonical rider tag
    pub rider: String,
}
