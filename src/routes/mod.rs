pub mod health;
pub mod rides;

use axum::routing::{delete, get};
use axum::Router;
use std::sync::Arc;

use crate::db::Storage;
use crate::services::route::Route;
use crate::services::weather::WeatherClient;

/// Shared application state.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) storage: Storage,
    pub(crate) weather: WeatherClient,
    pub(crate) route: Arc<Route>,
    pub(crate) challenge_target_km: f64,
}

/// API routes, without the documentation and middleware layers.
pub(crate) fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health_check))
        .route(
            "/api/v1/rides",
            get(rides::list_rides).post(rides::create_ride),
        )
        .route("/api/v1/rides/:id", delete(rides::delete_ride))
        .route("/api/v1/route", get(rides::get_route))
        .with_state(state)
}
