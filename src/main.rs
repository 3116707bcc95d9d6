// Ride Journal API v0.1
use axum::http::Method;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::{AppConfig, BackendConfig, MigrationConfig};
use db::csv_table::CsvStore;
use db::{LocalStore, PostgresStore, Storage};
use routes::AppState;
use services::migrate::copy_rides;
use services::route::Route;
use services::weather::WeatherClient;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// How long to wait for a free pool connection.
const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Ride Journal API: OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ride Journal API",
        version = "0.1.0",
        description = "Cycling journal for two riders. Records rides with the weather \
            at start and destination, aggregates distance per day, week, month and \
            year, places the combined distance on a virtual route from Kettenis \
            eastwards, and compares both riders against a trip around the world.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Rides", description = "Ride journal and dashboard snapshot"),
        (name = "Route", description = "Virtual route milestones"),
    ),
    paths(
        routes::health::health_check,
        routes::rides::list_rides,
        routes::rides::create_ride,
        routes::rides::delete_ride,
        routes::rides::get_route,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::rides::CreateRideResponse,
            routes::rides::DeleteRideResponse,
            routes::rides::RouteResponse,
            services::rides::RideSubmission,
            services::dashboard::Dashboard,
            services::dashboard::RiderTotals,
            services::dashboard::RiderProgress,
            services::normalize::Ride,
            services::normalize::Rider,
            services::stats::WindowTotals,
            services::route::Milestone,
            services::route::Progress,
            services::challenge::Challenge,
            errors::ErrorResponse,
            errors::RejectionCause,
        )
    )
)]
struct ApiDoc;

/// Lazy pool: the first query opens the connection.
fn postgres_pool(database_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .acquire_timeout(DB_ACQUIRE_TIMEOUT)
        .connect_lazy(database_url)
        .expect("Invalid DATABASE_URL")
}

/// `migrate-csv [--force]`: copy the CSV journal into the Postgres table.
async fn migrate_csv(force: bool) {
    let config = MigrationConfig::from_env().expect("Invalid configuration");
    let source = LocalStore::new(CsvStore::new(&config.csv_path), config.backend_timeout);

    let pool = postgres_pool(&config.database_url);
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    let dest = PostgresStore::new(pool, config.backend_timeout);

    tracing::info!(
        "Migrating rides from {} to Postgres",
        config.csv_path.display()
    );
    match copy_rides(&source, &dest, force).await {
        Ok(report) => {
            tracing::info!(
                "{} of {} rides migrated, {} errors",
                report.copied,
                report.read,
                report.failed
            );
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Migration aborted: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ride_journal_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("migrate-csv") {
        migrate_csv(args.iter().any(|a| a == "--force")).await;
        return;
    }

    let config = AppConfig::from_env().expect("Invalid configuration");

    let storage = match &config.backend {
        BackendConfig::Csv { path } => {
            tracing::info!("Using CSV ride table at {}", path.display());
            Storage::Csv(LocalStore::new(CsvStore::new(path), config.backend_timeout))
        }
        BackendConfig::Postgres { database_url } => {
            let pool = postgres_pool(database_url);

            match sqlx::migrate!().run(&pool).await {
                Ok(()) => tracing::info!("Database migrations completed"),
                Err(e) => tracing::warn!("Database migrations not applied: {}", e),
            }

            Storage::Postgres(PostgresStore::new(pool, config.backend_timeout))
        }
    };

    let builtin = || {
        Route::builtin(config.challenge_target_km).expect("Invalid CHALLENGE_TARGET_KM for route")
    };
    let route = match &config.route_gpx {
        Some(path) => services::route_gpx::load_route_file(path, config.challenge_target_km)
            .unwrap_or_else(|e| {
                tracing::error!(
                    "Failed to load route from {}: {}, using built-in route",
                    path.display(),
                    e
                );
                builtin()
            }),
        None => builtin(),
    };
    tracing::info!(
        "Route has {} milestones over {} km",
        route.milestones().len(),
        route.length_km()
    );

    let app_state = AppState {
        storage,
        weather: WeatherClient::new(&config.weather_base_url, config.weather_timeout),
        route: Arc::new(route),
        challenge_target_km: config.challenge_target_km,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let app = routes::api_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        "API server listening on {} ({} backend)",
        addr,
        config.backend.name()
    );
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
