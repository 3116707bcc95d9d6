//! Record normalizer.
//!
//! Turns loosely-typed rows from either storage backend into the canonical
//! [`Ride`] shape. Never fails: anything malformed is replaced by a default.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::RawRide;

/// Date format used in storage (and in the legacy CSV journal).
pub const STORED_DATE_FORMAT: &str = "%d/%m/%Y";

/// Placeholder the enrichment lookup and legacy rows use for "no value".
pub const NOT_AVAILABLE: &str = "N/A";

/// Tags (lowercase) that resolve to [`Rider::Alexandre`]: the canonical tag
/// plus the first-person tags older journal rows were written with.
const ALEXANDRE_ALIASES: &[&str] = &["alexandre", "moi", "ich", "me"];

/// One of the two riders in the challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Rider {
    Alexandre,
    /// The house rider: rows with a missing or unknown tag belong to him.
    Oswald,
}

impl Rider {
    pub const ALL: [Rider; 2] = [Rider::Alexandre, Rider::Oswald];

    /// Canonical tag written to storage.
    pub fn tag(self) -> &'static str {
        match self {
            Rider::Alexandre => "Alexandre",
            Rider::Oswald => "Oswald",
        }
    }

    /// Resolve a stored rider tag. Total: unknown, blank or absent tags all
    /// resolve to [`Rider::Oswald`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Rider::Oswald;
        };
        let tag = tag.trim().to_lowercase();
        if ALEXANDRE_ALIASES.contains(&tag.as_str()) {
            Rider::Alexandre
        } else {
            Rider::Oswald
        }
    }
}

impl std::fmt::Display for Rider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A ride in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Ride {
    /// Backend-assigned identifier, the handle for deletion
    pub id: String,
    /// Ride date as stored (`DD/MM/YYYY`)
    pub date: String,
    /// Parsed calendar date; `None` when the stored text is unparseable
    #[serde(skip)]
    pub day: Option<NaiveDate>,
    /// Start place, optionally suffixed with `(HH:MM)`
    pub start_label: String,
    /// Intermediate stop; empty when the ride had none
    pub waypoint_label: String,
    /// Destination place, optionally suffixed with `(HH:MM)`
    pub end_label: String,
    /// Weather at start and destination, e.g. "Sonnig +18°C / Bewölkt +16°C"
    pub weather_summary: String,
    pub distance_km: f64,
    pub notes: String,
    pub rider: Rider,
    pub photo_urls: Vec<String>,
    /// Minutes between the start and destination clock times, when both are present
    pub ride_minutes: Option<i64>,
    /// Average speed over `ride_minutes`
    pub average_speed_kmh: Option<f64>,
}

/// Normalize a raw backend row.
pub fn normalize(raw: RawRide, fallback_id: usize) -> Ride {
    let date = clean_text(raw.date);
    let day = NaiveDate::parse_from_str(date.trim(), STORED_DATE_FORMAT).ok();
    let start_label = clean_text(raw.start);
    let end_label = clean_text(raw.end);
    let distance_km = parse_distance(raw.distance_km.as_deref());

    let ride_minutes = clock_time(&start_label)
        .zip(clock_time(&end_label))
        .map(|(start, end)| (end - start).num_minutes())
        .filter(|&minutes| minutes > 0);
    let average_speed_kmh = ride_minutes
        .filter(|_| distance_km > 0.0)
        .map(|minutes| distance_km / (minutes as f64 / 60.0));

    Ride {
        id: raw
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("row-{}", fallback_id)),
        date,
        day,
        start_label,
        waypoint_label: clean_text(raw.waypoint),
        end_label,
        weather_summary: clean_text(raw.weather),
        distance_km,
        notes: clean_text(raw.notes),
        rider: Rider::from_tag(raw.rider.as_deref()),
        photo_urls: raw
            .photo_urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty() && url != NOT_AVAILABLE)
            .collect(),
        ride_minutes,
        average_speed_kmh,
    }
}

/// Absent, blank and "N/A" text all become the empty string.
fn clean_text(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() && v.trim() != NOT_AVAILABLE => v.trim().to_string(),
        _ => String::new(),
    }
}

/// Parse a stored distance. Missing, unparseable, negative and non-finite
/// values all become `0.0`. Accepts a decimal comma.
pub fn parse_distance(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let parsed = raw.trim().replace(',', ".").parse::<f64>();
    match parsed {
        Ok(km) if km.is_finite() && km >= 0.0 => km,
        Ok(km) => {
            tracing::warn!("Out-of-range distance {} in stored ride, using 0", km);
            0.0
        }
        Err(_) => {
            if !raw.trim().is_empty() {
                tracing::warn!("Unparseable distance '{}' in stored ride, using 0", raw);
            }
            0.0
        }
    }
}

/// Extract the `(HH:MM)` suffix of a place label.
pub fn clock_time(label: &str) -> Option<NaiveTime> {
    let label = label.trim_end();
    let inner = label.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    NaiveTime::parse_from_str(inner[open + 1..].trim(), "%H:%M").ok()
}

/// Strip the `(HH:MM)` suffix from a place label.
pub fn place_name(label: &str) -> &str {
    if clock_time(label).is_some() {
        if let Some(open) = label.rfind('(') {
            return label[..open].trim_end();
        }
    }
    label.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rider: Option<&str>, km: Option<&str>) -> RawRide {
        RawRide {
            id: Some("7".to_string()),
            date: Some("14/06/2025".to_string()),
            start: Some("Kettenis (10:00)".to_string()),
            waypoint: Some("N/A".to_string()),
            end: Some("Eupen (11:30)".to_string()),
            weather: None,
            distance_km: km.map(str::to_string),
            notes: Some("  ".to_string()),
            rider: rider.map(str::to_string),
            photo_urls: vec![],
        }
    }

    #[test]
    fn test_rider_canonical_tags() {
        assert_eq!(Rider::from_tag(Some("Alexandre")), Rider::Alexandre);
        assert_eq!(Rider::from_tag(Some("Oswald")), Rider::Oswald);
    }

    #[test]
    fn test_rider_aliases_case_insensitive() {
        for alias in ["alexandre", "ALEXANDRE", "Moi", "moi", "Ich", " ich ", "Me", "ME"] {
            assert_eq!(Rider::from_tag(Some(alias)), Rider::Alexandre, "alias {alias}");
        }
        assert_eq!(Rider::from_tag(Some("oswald")), Rider::Oswald);
    }

    #[test]
    fn test_rider_unknown_defaults_to_house_rider() {
        assert_eq!(Rider::from_tag(None), Rider::Oswald);
        assert_eq!(Rider::from_tag(Some("")), Rider::Oswald);
        assert_eq!(Rider::from_tag(Some("   ")), Rider::Oswald);
        assert_eq!(Rider::from_tag(Some("Opa")), Rider::Oswald);
        assert_eq!(Rider::from_tag(Some("Damien")), Rider::Oswald);
        assert_eq!(Rider::from_tag(Some("N/A")), Rider::Oswald);
    }

    #[test]
    fn test_rider_tag_round_trips() {
        for rider in Rider::ALL {
            assert_eq!(Rider::from_tag(Some(rider.tag())), rider);
        }
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let ride = normalize(raw(None, Some("23.4")), 0);
        assert_eq!(ride.id, "7");
        assert_eq!(ride.day, NaiveDate::from_ymd_opt(2025, 6, 14));
        assert_eq!(ride.waypoint_label, "");
        assert_eq!(ride.weather_summary, "");
        assert_eq!(ride.notes, "");
        assert!(ride.photo_urls.is_empty());
        assert_eq!(ride.rider, Rider::Oswald);
        assert_eq!(ride.distance_km, 23.4);
    }

    #[test]
    fn test_normalize_bad_distance_defaults_to_zero() {
        assert_eq!(normalize(raw(None, Some("abc")), 0).distance_km, 0.0);
        assert_eq!(normalize(raw(None, None), 0).distance_km, 0.0);
        assert_eq!(normalize(raw(None, Some("-5")), 0).distance_km, 0.0);
        assert_eq!(normalize(raw(None, Some("NaN")), 0).distance_km, 0.0);
        assert_eq!(normalize(raw(None, Some("12,5")), 0).distance_km, 12.5);
    }

    #[test]
    fn test_normalize_unparseable_date_keeps_text() {
        let mut r = raw(Some("Moi"), Some("5"));
        r.date = Some("2025-06-14".to_string());
        let ride = normalize(r, 0);
        assert_eq!(ride.date, "2025-06-14");
        assert_eq!(ride.day, None);
        assert_eq!(ride.rider, Rider::Alexandre);
    }

    #[test]
    fn test_normalize_missing_id_uses_fallback() {
        let mut r = raw(None, Some("5"));
        r.id = None;
        assert_eq!(normalize(r, 3).id, "row-3");
    }

    #[test]
    fn test_normalize_filters_blank_photos() {
        let mut r = raw(None, Some("5"));
        r.photo_urls = vec![
            "https://cdn.example/a.jpg".to_string(),
            " ".to_string(),
            "N/A".to_string(),
        ];
        assert_eq!(normalize(r, 0).photo_urls, vec!["https://cdn.example/a.jpg"]);
    }

    #[test]
    fn test_ride_time_and_speed_from_labels() {
        let ride = normalize(raw(None, Some("30")), 0);
        assert_eq!(ride.ride_minutes, Some(90));
        assert_eq!(ride.average_speed_kmh, Some(20.0));
    }

    #[test]
    fn test_ride_time_absent_without_clock_times() {
        let mut r = raw(None, Some("30"));
        r.end = Some("Eupen".to_string());
        let ride = normalize(r, 0);
        assert_eq!(ride.ride_minutes, None);
        assert_eq!(ride.average_speed_kmh, None);
    }

    #[test]
    fn test_place_name_strips_clock_time() {
        assert_eq!(place_name("Kettenis (10:00)"), "Kettenis");
        assert_eq!(place_name("Aachen (Hbf)"), "Aachen (Hbf)");
        assert_eq!(place_name(" Eupen "), "Eupen");
        assert_eq!(clock_time("Eupen (9:05)"), NaiveTime::from_hms_opt(9, 5, 0));
    }
}
