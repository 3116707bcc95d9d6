//! Ride HTTP endpoints.
//!
//! - GET    /api/v1/rides
//! - POST   /api/v1/rides
//! - DELETE /api/v1/rides/:id
//! - GET    /api/v1/route

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;
use crate::services::dashboard::{self, Dashboard};
use crate::services::loader;
use crate::services::rides::{self, RideSubmission};
use crate::services::route::Milestone;

/// Response for a stored ride.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRideResponse {
    pub success: bool,
    /// Identifier of the new ride
    pub id: String,
    pub message: String,
}

/// Response for a deleted ride.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteRideResponse {
    pub success: bool,
}

/// The active virtual route.
#[derive(Debug, Serialize, ToSchema)]
pub struct RouteResponse {
    /// Distance of the final milestone
    pub length_km: f64,
    pub milestones: Vec<Milestone>,
}

/// All rides with totals, route progress and the challenge standings.
///
/// Never fails: when the storage backend is unreachable the snapshot is
/// computed over an empty dataset.
#[utoipa::path(
    get,
    path = "/api/v1/rides",
    tag = "Rides",
    responses(
        (status = 200, description = "Dashboard snapshot", body = Dashboard),
    )
)]
pub async fn list_rides(State(state): State<AppState>) -> Json<Dashboard> {
    let rides = loader::load(&state.storage).await;
    let today = chrono::Local::now().date_naive();
    Json(dashboard::build(
        rides,
        today,
        &state.route,
        state.challenge_target_km,
    ))
}

/// Record a new ride.
///
/// Looks up the weather at start and destination before storing; a failed
/// lookup is recorded as "N/A" and does not block the write.
#[utoipa::path(
    post,
    path = "/api/v1/rides",
    tag = "Rides",
    request_body = RideSubmission,
    responses(
        (status = 201, description = "Ride stored", body = CreateRideResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 502, description = "Storage backend rejected the ride", body = ErrorResponse),
        (status = 503, description = "Storage backend unreachable", body = ErrorResponse),
    )
)]
pub async fn create_ride(
    State(state): State<AppState>,
    Json(submission): Json<RideSubmission>,
) -> Result<(StatusCode, Json<CreateRideResponse>), AppError> {
    let id = rides::create_ride(&state.storage, &state.weather, submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateRideResponse {
            success: true,
            message: format!("Ride {} saved", id),
            id,
        }),
    ))
}

/// Delete a ride by id.
#[utoipa::path(
    delete,
    path = "/api/v1/rides/{id}",
    tag = "Rides",
    params(
        ("id" = String, Path, description = "Ride identifier"),
    ),
    responses(
        (status = 200, description = "Ride deleted", body = DeleteRideResponse),
        (status = 404, description = "Ride not found", body = ErrorResponse),
        (status = 503, description = "Storage backend unreachable", body = ErrorResponse),
    )
)]
pub async fn delete_ride(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteRideResponse>, AppError> {
    rides::delete_ride(&state.storage, &id).await?;
    Ok(Json(DeleteRideResponse { success: true }))
}

/// The milestones of the active route.
#[utoipa::path(
    get,
    path = "/api/v1/route",
    tag = "Route",
    responses(
        (status = 200, description = "Route milestones in order", body = RouteResponse),
    )
)]
pub async fn get_route(State(state): State<AppState>) -> Json<RouteResponse> {
    Json(RouteResponse {
        length_km: state.route.length_km(),
        milestones: state.route.milestones().to_vec(),
    })
}
