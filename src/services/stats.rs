//! Time-window distance totals.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::normalize::{Ride, Rider};

/// Distance sums over the standard windows, all in km.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct WindowTotals {
    pub all_time: f64,
    pub today: f64,
    /// Since Monday of the reference week
    pub week: f64,
    pub month: f64,
    pub year: f64,
}

impl std::ops::Add for WindowTotals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            all_time: self.all_time + other.all_time,
            today: self.today + other.today,
            week: self.week + other.week,
            month: self.month + other.month,
            year: self.year + other.year,
        }
    }
}

/// Window start dates for a reference day.
struct Windows {
    today: NaiveDate,
    week_start: NaiveDate,
    month_start: NaiveDate,
    year_start: NaiveDate,
}

impl Windows {
    fn new(today: NaiveDate) -> Self {
        let days_since_monday = u64::from(today.weekday().num_days_from_monday());
        Self {
            today,
            week_start: today
                .checked_sub_days(Days::new(days_since_monday))
                .unwrap_or(NaiveDate::MIN),
            month_start: today.with_day(1).unwrap_or(today),
            year_start: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        }
    }
}

/// Totals across all riders.
///
/// Summed per rider first, so every window equals the sum of the
/// per-rider windows bit for bit.
pub fn aggregate(rides: &[Ride], today: NaiveDate) -> WindowTotals {
    Rider::ALL
        .iter()
        .map(|&rider| aggregate_for(rides, rider, today))
        .fold(WindowTotals::default(), |sum, totals| sum + totals)
}

/// Totals for a single rider.
pub fn aggregate_for(rides: &[Ride], rider: Rider, today: NaiveDate) -> WindowTotals {
    sum_windows(rides.iter().filter(|r| r.rider == rider), today)
}

/// Rides without a parseable date count toward `all_time` only.
fn sum_windows<'a>(rides: impl Iterator<Item = &'a Ride>, today: NaiveDate) -> WindowTotals {
    let w = Windows::new(today);
    rides.fold(WindowTotals::default(), |mut totals, ride| {
        let km = ride.distance_km;
        totals.all_time += km;
        if let Some(day) = ride.day {
            if day == w.today {
                totals.today += km;
            }
            if day >= w.week_start {
                totals.week += km;
            }
            if day >= w.month_start {
                totals.month += km;
            }
            if day >= w.year_start {
                totals.year += km;
            }
        }
        totals
    })
}
