//! Local flat-file ride table.
//!
//! One CSV file, one row per ride. Column names follow the legacy journal
//! (`Date,Start,Etape,Ziel,Wetter,Km,Bemerkungen`) plus `Id`, `Rider` and
//! `Photos`; files written before those three columns existed still load.
//! Rows without an `Id` are addressed as `row-<n>` (file position) until
//! the next write assigns them a permanent one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{NewRide, RawRide};

#[derive(Debug, thiserror::Error)]
pub enum CsvTableError {
    #[error("IO error on ride table: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error on ride table: {0}")]
    Csv(#[from] csv::Error),
    #[error("No ride with id '{0}'")]
    UnknownId(String),
}

/// One CSV row. Only stored columns appear here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Id", default)]
    id: Option<String>,
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Start", default)]
    start: Option<String>,
    #[serde(rename = "Etape", default)]
    waypoint: Option<String>,
    #[serde(rename = "Ziel", default)]
    end: Option<String>,
    #[serde(rename = "Wetter", default)]
    weather: Option<String>,
    #[serde(rename = "Km", default)]
    distance_km: Option<String>,
    #[serde(rename = "Bemerkungen", default)]
    notes: Option<String>,
    #[serde(rename = "Rider", default)]
    rider: Option<String>,
    /// JSON array of URLs
    #[serde(rename = "Photos", default)]
    photos: Option<String>,
}

impl CsvRecord {
    fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }

    /// The identifier this row is addressed by.
    fn address(&self, position: usize) -> String {
        match &self.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => legacy_id(position),
        }
    }

    fn into_raw(self, position: usize) -> RawRide {
        let id = Some(self.address(position));
        let photo_urls = match self.photos.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(json) => serde_json::from_str(json).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed Photos cell '{}': {}", json, e);
                Vec::new()
            }),
        };
        RawRide {
            id,
            date: self.date,
            start: self.start,
            waypoint: self.waypoint,
            end: self.end,
            weather: self.weather,
            distance_km: self.distance_km,
            notes: self.notes,
            rider: self.rider,
            photo_urls,
        }
    }
}

fn legacy_id(position: usize) -> String {
    format!("row-{}", position)
}

/// Flat-file ride table.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Arc<Mutex<()>>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rides, most recently added first. A missing file is an empty table.
    pub async fn list_all(&self) -> Result<Vec<RawRide>, CsvTableError> {
        let records = self.read_records().await?;
        Ok(records
            .into_iter()
            .enumerate()
            .rev()
            .map(|(position, record)| record.into_raw(position))
            .collect())
    }

    /// Append a ride, returning its new identifier.
    pub async fn insert(&self, ride: NewRide) -> Result<String, CsvTableError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await?;
        let id = Uuid::new_v4().to_string();
        records.push(CsvRecord {
            id: Some(id.clone()),
            date: Some(ride.date),
            start: Some(ride.start_label),
            waypoint: ride.waypoint_label,
            end: Some(ride.end_label),
            weather: ride.weather_summary,
            distance_km: Some(ride.distance_km.to_string()),
            notes: ride.notes,
            rider: Some(ride.rider),
            photos: None,
        });
        self.write_records(records).await?;
        Ok(id)
    }

    /// Remove the ride with the given identifier.
    pub async fn delete(&self, id: &str) -> Result<(), CsvTableError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await?;
        let position = records
            .iter()
            .enumerate()
            .position(|(position, record)| record.address(position) == id.trim())
            .ok_or_else(|| CsvTableError::UnknownId(id.to_string()))?;
        records.remove(position);
        self.write_records(records).await
    }

    /// Whether the table can be read right now.
    pub async fn ping(&self) -> bool {
        self.read_records().await.is_ok()
    }

    async fn read_records(&self) -> Result<Vec<CsvRecord>, CsvTableError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        parse_records(&bytes)
    }

    /// Write the full table through a temporary file so readers never see a
    /// partial table. Rows still lacking an id get one here.
    async fn write_records(&self, mut records: Vec<CsvRecord>) -> Result<(), CsvTableError> {
        for record in records.iter_mut().filter(|r| !r.has_id()) {
            record.id = Some(Uuid::new_v4().to_string());
        }
        let bytes = serialize_records(&records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Wrote {} rides to {}", records.len(), self.path.display());
        Ok(())
    }
}

fn parse_records(bytes: &[u8]) -> Result<Vec<CsvRecord>, CsvTableError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRecord>() {
        records.push(result?);
    }
    Ok(records)
}

fn serialize_records(records: &[CsvRecord]) -> Result<Vec<u8>, CsvTableError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record([
            "Id",
            "Date",
            "Start",
            "Etape",
            "Ziel",
            "Wetter",
            "Km",
            "Bemerkungen",
            "Rider",
            "Photos",
        ])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| CsvTableError::Io(e.into_error()))
}
