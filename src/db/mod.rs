//! Ride storage.
//!
//! [`RideStore`] is the record-level interface the services use. Two
//! implementations exist, a local CSV table and a hosted Postgres table;
//! [`Storage`] holds whichever one the process was configured with.

pub mod csv_table;
pub mod models;
pub mod queries;

use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

use crate::errors::AppError;
use csv_table::CsvStore;
use models::{NewRide, RawRide};

/// Record-level CRUD over the ride table.
pub trait RideStore: Send + Sync {
    /// Every stored row, backend-native order.
    fn list_all(&self) -> impl Future<Output = Result<Vec<RawRide>, AppError>> + Send;

    /// Append a ride, returning its backend-assigned identifier.
    fn insert(&self, ride: NewRide) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Remove a ride. Unknown identifiers are `AppError::NotFound`.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Run a backend call under a deadline.
async fn bounded<T, E, F>(timeout: Duration, what: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::BackendUnavailable(format!(
            "{} timed out after {}s",
            what,
            timeout.as_secs()
        ))),
    }
}

/// The hosted `rides` table.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

impl RideStore for PostgresStore {
    async fn list_all(&self) -> Result<Vec<RawRide>, AppError> {
        let rows = bounded(self.timeout, "listing rides", queries::list_rides(&self.pool)).await?;
        Ok(rows.into_iter().map(RawRide::from).collect())
    }

    async fn insert(&self, ride: NewRide) -> Result<String, AppError> {
        let row = bounded(
            self.timeout,
            "inserting ride",
            queries::insert_ride(&self.pool, &ride),
        )
        .await?;
        tracing::info!(
            "Stored ride {} ({} km, {}) at {}",
            row.id,
            row.distance_km,
            ride.rider,
            row.created_at
        );
        Ok(row.id.to_string())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let not_found = || AppError::NotFound(format!("Ride {} not found", id));
        let numeric_id: i64 = id.trim().parse().map_err(|_| not_found())?;
        bounded(
            self.timeout,
            "deleting ride",
            queries::delete_ride(&self.pool, numeric_id),
        )
        .await?
        .map(|_| ())
        .ok_or_else(not_found)
    }
}

/// CSV store. Reads run under a deadline; writes always run to completion.
#[derive(Debug, Clone)]
pub struct LocalStore {
    table: CsvStore,
    timeout: Duration,
}

impl LocalStore {
    pub fn new(table: CsvStore, timeout: Duration) -> Self {
        Self { table, timeout }
    }
}

impl RideStore for LocalStore {
    async fn list_all(&self) -> Result<Vec<RawRide>, AppError> {
        bounded(self.timeout, "reading ride table", self.table.list_all()).await
    }

    async fn insert(&self, ride: NewRide) -> Result<String, AppError> {
        let rider = ride.rider.clone();
        let id = self.table.insert(ride).await?;
        tracing::info!("Stored ride {} for {} in {}", id, rider, self.table.path().display());
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        Ok(self.table.delete(id).await?)
    }
}

/// The backend selected at startup.
#[derive(Debug, Clone)]
pub enum Storage {
    Csv(LocalStore),
    Postgres(PostgresStore),
}

impl Storage {
    pub fn name(&self) -> &'static str {
        match self {
            Storage::Csv(_) => "csv",
            Storage::Postgres(_) => "postgres",
        }
    }

    /// Whether the backend is reachable right now.
    pub async fn ping(&self) -> bool {
        match self {
            Storage::Csv(store) => store.table.ping().await,
            Storage::Postgres(store) => queries::ping(&store.pool).await,
        }
    }
}

impl RideStore for Storage {
    async fn list_all(&self) -> Result<Vec<RawRide>, AppError> {
        match self {
            Storage::Csv(store) => store.list_all().await,
            Storage::Postgres(store) => store.list_all().await,
        }
    }

    async fn insert(&self, ride: NewRide) -> Result<String, AppError> {
        match self {
            Storage::Csv(store) => store.insert(ride).await,
            Storage::Postgres(store) => store.insert(ride).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        match self {
            Storage::Csv(store) => store.delete(id).await,
            Storage::Postgres(store) => store.delete(id).await,
        }
    }
}
