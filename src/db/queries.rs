use sqlx::PgPool;

use super::models::{NewRide, RideRow};
use crate::helpers::f64_to_decimal_1dp;

const RIDE_COLUMNS: &str = "id, date, start_label, waypoint_label, end_label, weather_summary, \
     distance_km, notes, rider, photo_urls, created_at";

/// List all rides, newest first.
pub async fn list_rides(pool: &PgPool) -> Result<Vec<RideRow>, sqlx::Error> {
    sqlx::query_as::<_, RideRow>(&format!(
        "SELECT {} FROM rides ORDER BY id DESC",
        RIDE_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

/// Insert a ride and return the stored row.
pub async fn insert_ride(pool: &PgPool, ride: &NewRide) -> Result<RideRow, sqlx::Error> {
    sqlx::query_as::<_, RideRow>(&format!(
        "INSERT INTO rides (
            date, start_label, waypoint_label, end_label, weather_summary,
            distance_km, notes, rider, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING {}",
        RIDE_COLUMNS
    ))
    .bind(&ride.date)
    .bind(&ride.start_label)
    .bind(&ride.waypoint_label)
    .bind(&ride.end_label)
    .bind(&ride.weather_summary)
    .bind(f64_to_decimal_1dp(ride.distance_km))
    .bind(&ride.notes)
    .bind(&ride.rider)
    .fetch_one(pool)
    .await
}

/// Delete a ride by id. Returns `None` when no row matched.
pub async fn delete_ride(pool: &PgPool, id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("DELETE FROM rides WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Connectivity check used by the health endpoint.
pub async fn ping(pool: &PgPool) -> bool {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .is_ok()
}
