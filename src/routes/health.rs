use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when healthy, "degraded" when storage is unreachable)
    pub status: String,
    /// API version
    pub version: String,
    /// Active storage backend ("csv" or "postgres")
    pub backend: String,
    /// Whether the storage backend is reachable
    pub storage: bool,
}

/// Health check endpoint.
///
/// Returns the API status, version and active backend. Probes the backend
/// and reports status "degraded" (still 200) when it is unreachable.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_ok = state.storage.ping().await;

    Json(HealthResponse {
        status: if storage_ok {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.storage.name().to_string(),
        storage: storage_ok,
    })
}
