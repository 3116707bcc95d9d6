//! Recording and deleting rides.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::db::models::NewRide;
use crate::db::RideStore;
use crate::errors::AppError;
use crate::helpers::round_km;
use crate::services::normalize::{parse_distance, Rider, STORED_DATE_FORMAT};
use crate::services::weather::WeatherClient;

/// Date format accepted from clients.
pub const SUBMISSION_DATE_FORMAT: &str = "%Y-%m-%d";

const DEFAULT_START_TIME: &str = "10:00";
const DEFAULT_WAYPOINT_TIME: &str = "11:30";
const DEFAULT_END_TIME: &str = "12:30";

/// A ride as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RideSubmission {
    /// Ride date, `YYYY-MM-DD`
    #[schema(example = "2025-10-15")]
    pub date: Option<String>,
    /// Start place
    #[schema(example = "Kettenis")]
    pub start: Option<String>,
    /// Optional intermediate stop
    pub waypoint: Option<String>,
    /// Destination place
    #[schema(example = "Eupen")]
    pub end: Option<String>,
    /// Distance in km, as a number or numeric string; unparseable values count as 0
    #[schema(value_type = Option<f64>, example = 23.5)]
    pub distance: Option<serde_json::Value>,
    /// Departure time `HH:MM` (default 10:00)
    pub start_time: Option<String>,
    /// Time at the waypoint `HH:MM` (default 11:30)
    pub waypoint_time: Option<String>,
    /// Arrival time `HH:MM` (default 12:30)
    pub end_time: Option<String>,
    pub notes: Option<String>,
    /// Rider tag; unknown or absent tags record the ride for Oswald
    #[schema(example = "Alexandre")]
    pub rider: Option<String>,
}

/// Validate a submission, enrich it with weather and store it.
/// Returns the backend-assigned id.
pub async fn create_ride<S: RideStore>(
    store: &S,
    weather: &WeatherClient,
    submission: RideSubmission,
) -> Result<String, AppError> {
    let date = required(submission.date.as_deref(), "date")?;
    let day = NaiveDate::parse_from_str(date, SUBMISSION_DATE_FORMAT).map_err(|_| {
        AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", date))
    })?;
    let start = required(submission.start.as_deref(), "start")?;
    let end = required(submission.end.as_deref(), "end")?;
    let waypoint = optional(submission.waypoint.as_deref());

    let start_time = clock(submission.start_time.as_deref(), DEFAULT_START_TIME, "start_time")?;
    let end_time = clock(submission.end_time.as_deref(), DEFAULT_END_TIME, "end_time")?;
    let waypoint_time = clock(
        submission.waypoint_time.as_deref(),
        DEFAULT_WAYPOINT_TIME,
        "waypoint_time",
    )?;

    let distance_km = round_km(coerce_distance(submission.distance.as_ref()));
    let rider = Rider::from_tag(submission.rider.as_deref());

    let (start_weather, end_weather) =
        futures::future::join(weather.describe(start), weather.describe(end)).await;

    let ride = NewRide {
        date: day.format(STORED_DATE_FORMAT).to_string(),
        start_label: timed_label(start, start_time),
        waypoint_label: waypoint.map(|place| timed_label(place, waypoint_time)),
        end_label: timed_label(end, end_time),
        weather_summary: Some(format!("{} / {}", start_weather, end_weather)),
        distance_km,
        notes: optional(submission.notes.as_deref()).map(str::to_string),
        rider: rider.tag().to_string(),
    };

    tracing::debug!(
        "Recording {} km ride on {} for {}",
        ride.distance_km,
        ride.date,
        rider
    );
    store.insert(ride).await
}

/// Delete a ride by id.
pub async fn delete_ride<S: RideStore>(store: &S, id: &str) -> Result<(), AppError> {
    store.delete(id.trim()).await?;
    tracing::info!("Deleted ride {}", id);
    Ok(())
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    optional(value).ok_or_else(|| AppError::Validation(format!("Missing required field '{}'", field)))
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn clock(value: Option<&str>, default: &str, field: &str) -> Result<NaiveTime, AppError> {
    let text = optional(value).unwrap_or(default);
    NaiveTime::parse_from_str(text, "%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid {} '{}', expected HH:MM", field, text)))
}

fn timed_label(place: &str, time: NaiveTime) -> String {
    format!("{} ({})", place, time.format("%H:%M"))
}

/// Numbers and numeric strings are accepted; anything else counts as 0 km.
fn coerce_distance(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => parse_distance(Some(&n.to_string())),
        Some(serde_json::Value::String(s)) => parse_distance(Some(s)),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn weather_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Kettenis"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Sonnig +18°C"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Eupen"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Bewölkt +16°C"))
            .mount(&server)
            .await;
        server
    }

    fn weather_for(server: &MockServer) -> WeatherClient {
        WeatherClient::new(&server.uri(), Duration::from_secs(2))
    }

    fn submission() -> RideSubmission {
        RideSubmission {
            date: Some("2025-10-15".to_string()),
            start: Some("Kettenis".to_string()),
            end: Some("Eupen".to_string()),
            distance: Some(json!(23.46)),
            rider: Some("Moi".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_ride_stores_normalized_record() {
        let server = weather_server().await;
        let store = MemoryStore::default();

        let id = create_ride(&store, &weather_for(&server), submission())
            .await
            .unwrap();
        assert_eq!(id, "1");

        let inserted = store.inserted.lock().unwrap();
        let ride = &inserted[0];
        assert_eq!(ride.date, "15/10/2025");
        assert_eq!(ride.start_label, "Kettenis (10:00)");
        assert_eq!(ride.waypoint_label, None);
        assert_eq!(ride.end_label, "Eupen (12:30)");
        assert_eq!(ride.distance_km, 23.5);
        assert_eq!(ride.rider, "Alexandre");
        assert_eq!(
            ride.weather_summary.as_deref(),
            Some("Sonnig +18°C / Bewölkt +16°C")
        );
    }

    #[tokio::test]
    async fn test_create_ride_with_waypoint_and_times() {
        let server = weather_server().await;
        let store = MemoryStore::default();
        let sub = RideSubmission {
            waypoint: Some(" Raeren ".to_string()),
            start_time: Some("08:15".to_string()),
            waypoint_time: Some("09:00".to_string()),
            end_time: Some("09:45".to_string()),
            notes: Some("Gegenwind".to_string()),
            ..submission()
        };

        create_ride(&store, &weather_for(&server), sub).await.unwrap();

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].start_label, "Kettenis (08:15)");
        assert_eq!(inserted[0].waypoint_label.as_deref(), Some("Raeren (09:00)"));
        assert_eq!(inserted[0].end_label, "Eupen (09:45)");
        assert_eq!(inserted[0].notes.as_deref(), Some("Gegenwind"));
    }

    #[tokio::test]
    async fn test_create_ride_weather_failure_still_writes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let store = MemoryStore::default();

        create_ride(&store, &weather_for(&server), submission())
            .await
            .unwrap();

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].weather_summary.as_deref(), Some("N/A / N/A"));
    }

    #[tokio::test]
    async fn test_create_ride_unknown_rider_is_house_rider() {
        let server = weather_server().await;
        let store = MemoryStore::default();
        let sub = RideSubmission {
            rider: Some("Opa".to_string()),
            ..submission()
        };
        create_ride(&store, &weather_for(&server), sub).await.unwrap();
        assert_eq!(store.inserted.lock().unwrap()[0].rider, "Oswald");
    }

    #[tokio::test]
    async fn test_create_ride_coerces_distance() {
        let server = weather_server().await;
        for (raw, expected) in [
            (json!("12,5"), 12.5),
            (json!("abc"), 0.0),
            (json!(-4), 0.0),
            (json!(null), 0.0),
            (json!(true), 0.0),
        ] {
            let store = MemoryStore::default();
            let sub = RideSubmission {
                distance: Some(raw.clone()),
                ..submission()
            };
            create_ride(&store, &weather_for(&server), sub).await.unwrap();
            assert_eq!(
                store.inserted.lock().unwrap()[0].distance_km,
                expected,
                "distance {raw}"
            );
        }
    }

    #[tokio::test]
    async fn test_create_ride_validation_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Sonnig"))
            .expect(0)
            .mount(&server)
            .await;

        let cases = [
            RideSubmission {
                date: None,
                ..submission()
            },
            RideSubmission {
                date: Some("15/10/2025".to_string()),
                ..submission()
            },
            RideSubmission {
                start: Some("   ".to_string()),
                ..submission()
            },
            RideSubmission {
                end: None,
                ..submission()
            },
            RideSubmission {
                start_time: Some("25:99".to_string()),
                ..submission()
            },
        ];

        for sub in cases {
            let store = MemoryStore::default();
            let err = create_ride(&store, &weather_for(&server), sub)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
            assert!(store.inserted.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_create_ride_backend_failure_propagates() {
        let server = weather_server().await;
        let store = MemoryStore::offline();
        let err = create_ride(&store, &weather_for(&server), submission())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_delete_ride() {
        let server = weather_server().await;
        let store = MemoryStore::default();
        let id = create_ride(&store, &weather_for(&server), submission())
            .await
            .unwrap();

        delete_ride(&store, &id).await.unwrap();
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_ride_is_not_found() {
        let store = MemoryStore::default();
        let err = delete_ride(&store, "42").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
