//! Aggregate snapshot served to the dashboard.
//!
//! Recomputed from the full dataset on every request and never stored.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::challenge::{challenge, Challenge};
use crate::services::normalize::{Ride, Rider};
use crate::services::route::{resolve, Progress, Route};
use crate::services::stats::{aggregate, aggregate_for, WindowTotals};

/// All-time and window totals per rider, keyed by rider tag.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RiderTotals {
    #[serde(rename = "Alexandre")]
    pub alexandre: WindowTotals,
    #[serde(rename = "Oswald")]
    pub oswald: WindowTotals,
}

impl RiderTotals {
    pub fn of(&self, rider: Rider) -> &WindowTotals {
        match rider {
            Rider::Alexandre => &self.alexandre,
            Rider::Oswald => &self.oswald,
        }
    }
}

/// Route progress per rider, keyed by rider tag.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RiderProgress {
    #[serde(rename = "Alexandre")]
    pub alexandre: Progress,
    #[serde(rename = "Oswald")]
    pub oswald: Progress,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dashboard {
    /// All rides, backend order
    pub rides: Vec<Ride>,
    /// Combined totals of both riders
    pub stats: WindowTotals,
    pub rider_stats: RiderTotals,
    /// Combined all-time distance on the route
    pub progression: Progress,
    /// Each rider's own all-time distance on the route
    pub rider_progression: RiderProgress,
    pub challenge: Challenge,
}

/// Assemble the snapshot for `today`.
pub fn build(rides: Vec<Ride>, today: NaiveDate, route: &Route, target_km: f64) -> Dashboard {
    let stats = aggregate(&rides, today);
    let rider_stats = RiderTotals {
        alexandre: aggregate_for(&rides, Rider::Alexandre, today),
        oswald: aggregate_for(&rides, Rider::Oswald, today),
    };
    let progression = resolve(stats.all_time, route);
    let rider_progression = RiderProgress {
        alexandre: resolve(rider_stats.of(Rider::Alexandre).all_time, route),
        oswald: resolve(rider_stats.of(Rider::Oswald).all_time, route),
    };
    let challenge = challenge(
        rider_stats.alexandre.all_time,
        rider_stats.oswald.all_time,
        target_km,
    );

    Dashboard {
        rides,
        stats,
        rider_stats,
        progression,
        rider_progression,
        challenge,
    }
}
