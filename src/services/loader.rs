//! Dataset loader: fetch every stored ride and normalize it.

use crate::db::RideStore;
use crate::services::normalize::{normalize, Ride};

/// Load the full ride dataset from the active backend.
///
/// Reads never fail visibly: a backend error or timeout is logged and
/// yields an empty dataset. Order is whatever the backend returns.
pub async fn load<S: RideStore>(store: &S) -> Vec<Ride> {
    match store.list_all().await {
        Ok(rows) => {
            let rides: Vec<Ride> = rows
                .into_iter()
                .enumerate()
                .map(|(idx, raw)| normalize(raw, idx))
                .collect();
            tracing::debug!("Loaded {} rides", rides.len());
            rides
        }
        Err(e) => {
            tracing::warn!("Failed to load rides, continuing with empty dataset: {}", e);
            Vec::new()
        }
    }
}
