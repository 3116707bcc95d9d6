//! One-off copy of the ride journal from one backend into another, used to
//! move the local CSV table into the hosted Postgres table.

use crate::db::models::{NewRide, RawRide};
use crate::db::RideStore;
use crate::errors::AppError;
use crate::helpers::round_km;
use crate::services::normalize::{parse_distance, Rider};

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("Cannot read source rides: {0}")]
    Source(AppError),
    #[error("Cannot read destination rides: {0}")]
    Destination(AppError),
    #[error("Destination already holds {0} rides; rerun with --force to copy anyway")]
    NotEmpty(usize),
}

/// Outcome of a copy run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MigrationReport {
    /// Rows read from the source
    pub read: usize,
    pub copied: usize,
    pub failed: usize,
}

/// Copy every source ride into `dest`, oldest first.
///
/// A destination that already has rows is refused unless `force` is set.
/// Rows that fail to insert are
/// logged and counted; the run continues with the next row.
pub async fn copy_rides<S, D>(
    source: &S,
    dest: &D,
    force: bool,
) -> Result<MigrationReport, MigrateError>
where
    S: RideStore,
    D: RideStore,
{
    let rows = source.list_all().await.map_err(MigrateError::Source)?;
    let mut report = MigrationReport {
        read: rows.len(),
        ..Default::default()
    };
    if rows.is_empty() {
        tracing::info!("No rides in source, nothing to migrate");
        return Ok(report);
    }

    let existing = dest.list_all().await.map_err(MigrateError::Destination)?.len();
    if existing > 0 {
        if !force {
            return Err(MigrateError::NotEmpty(existing));
        }
        tracing::warn!("Destination already holds {} rides, copying anyway", existing);
    }

    // Backends list newest first
    for (n, raw) in rows.into_iter().rev().enumerate() {
        let position = n + 1;
        let source_id = raw.id.clone().unwrap_or_else(|| format!("#{}", position));
        match dest.insert(to_new_ride(raw)).await {
            Ok(id) => {
                report.copied += 1;
                tracing::info!(
                    "Migrated ride {}/{} ({} -> {})",
                    position,
                    report.read,
                    source_id,
                    id
                );
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!("Failed to migrate ride {} ({}): {}", position, source_id, e);
            }
        }
    }

    tracing::info!(
        "Migration finished: {} copied, {} failed",
        report.copied,
        report.failed
    );
    Ok(report)
}

/// Stored columns carried over as they are; distance and rider are brought
/// into their canonical form.
fn to_new_ride(raw: RawRide) -> NewRide {
    NewRide {
        date: raw.date.unwrap_or_default(),
        start_label: raw.start.unwrap_or_default(),
        waypoint_label: non_blank(raw.waypoint),
        end_label: raw.end.unwrap_or_default(),
        weather_summary: non_blank(raw.weather),
        distance_km: round_km(parse_distance(raw.distance_km.as_deref())),
        notes: non_blank(raw.notes),
        rider: Rider::from_tag(raw.rider.as_deref()).tag().to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn raw(id: &str, km: &str, rider: Option<&str>) -> RawRide {
        RawRide {
            id: Some(id.to_string()),
            date: Some("14/10/2025".to_string()),
            start: Some("Kettenis (10:00)".to_string()),
            waypoint: Some(String::new()),
            end: Some("Eupen (12:30)".to_string()),
            weather: Some("Sonnig +18°C / Sonnig +17°C".to_string()),
            distance_km: Some(km.to_string()),
            notes: None,
            rider: rider.map(str::to_string),
            photo_urls: vec![],
        }
    }

    /// Newest first, as backends list them.
    fn journal() -> MemoryStore {
        MemoryStore::with_rows(vec![
            raw("row-3", "7,4", Some("moi")),
            raw("row-2", "abc", None),
            raw("row-1", "20", Some("Alexandre")),
        ])
    }

    #[tokio::test]
    async fn test_copies_every_row_oldest_first() {
        let source = journal();
        let dest = MemoryStore::default();

        let report = copy_rides(&source, &dest, false).await.unwrap();
        assert_eq!(
            report,
            MigrationReport {
                read: 3,
                copied: 3,
                failed: 0
            }
        );

        let inserted = dest.inserted.lock().unwrap();
        let distances: Vec<f64> = inserted.iter().map(|r| r.distance_km).collect();
        assert_eq!(distances, vec![20.0, 0.0, 7.4]);
        assert_eq!(inserted[0].rider, "Alexandre");
        assert_eq!(inserted[1].rider, "Oswald");
        assert_eq!(inserted[2].rider, "Alexandre");
        assert_eq!(inserted[0].date, "14/10/2025");
        assert_eq!(inserted[0].start_label, "Kettenis (10:00)");
        assert_eq!(inserted[0].waypoint_label, None);
        assert_eq!(
            inserted[0].weather_summary.as_deref(),
            Some("Sonnig +18°C / Sonnig +17°C")
        );
    }

    #[tokio::test]
    async fn test_non_empty_destination_is_refused() {
        let source = journal();
        let dest = MemoryStore::with_rows(vec![raw("1", "5", None)]);

        let err = copy_rides(&source, &dest, false).await.unwrap_err();
        assert!(matches!(err, MigrateError::NotEmpty(1)));
        assert!(dest.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_force_copies_into_non_empty_destination() {
        let source = journal();
        let dest = MemoryStore::with_rows(vec![raw("1", "5", None)]);

        let report = copy_rides(&source, &dest, true).await.unwrap();
        assert_eq!(report.copied, 3);
        assert_eq!(dest.rows.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_source_touches_nothing() {
        let dest = MemoryStore::offline();
        let report = copy_rides(&MemoryStore::default(), &dest, false)
            .await
            .unwrap();
        assert_eq!(report, MigrationReport::default());
    }

    #[tokio::test]
    async fn test_unreachable_stores_are_reported() {
        let err = copy_rides(&MemoryStore::offline(), &MemoryStore::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Source(_)));

        let err = copy_rides(&journal(), &MemoryStore::offline(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Destination(_)));
    }

    #[tokio::test]
    async fn test_failed_inserts_are_counted() {
        let dest = MemoryStore {
            failing_inserts: true,
            ..Default::default()
        };

        let report = copy_rides(&journal(), &dest, false).await.unwrap();
        assert_eq!(
            report,
            MigrationReport {
                read: 3,
                copied: 0,
                failed: 3
            }
        );
    }
}
