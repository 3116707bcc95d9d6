//! Virtual route and milestone resolution.
//!
//! A route is a static, ordered list of `(cumulative km, place)` milestones.
//! Resolving a cumulative distance against it tells the riders where they
//! are on the map and how far it is to the next place.

use serde::Serialize;
use utoipa::ToSchema;

/// Place label of the final circumnavigation milestone.
pub const TARGET_PLACE: &str = "🌍 Weltreise!";

/// Built-in route: Kettenis through Belgium and Germany towards Ukraine,
/// ending in the circumnavigation sentinel at the default target.
pub const DEFAULT_ROUTE: &[(f64, &str)] = &[
    (0.0, "🏠 Kettenis"),
    (18.0, "🇧🇪 Verviers"),
    (42.0, "🇧🇪 Lüttich (Liège)"),
    (75.0, "🇧🇪 Tongeren"),
    (105.0, "🇧🇪 Hasselt"),
    (135.0, "🇧🇪 Löwen (Leuven)"),
    (155.0, "🇧🇪 Brüssel"),
    (185.0, "🇧🇪 Gent"),
    (212.0, "🇧🇪 Knokke-Heist"),
    (245.0, "🇧🇪 Kortrijk (Courtrai)"),
    (280.0, "🇩🇪 Gummersbach"),
    (310.0, "🇩🇪 Siegen"),
    (340.0, "🇩🇪 Marburg"),
    (370.0, "🇩🇪 Giessen"),
    (405.0, "🇩🇪 Wetzlar"),
    (435.0, "🇩🇪 Fulda"),
    (465.0, "🇩🇪 Bad Hersfeld"),
    (500.0, "🇩🇪 Eisenach"),
    (530.0, "🇩🇪 Gotha"),
    (560.0, "🇩🇪 Erfurt"),
    (590.0, "🇩🇪 Weimar"),
    (620.0, "🇩🇪 Jena"),
    (650.0, "🇩🇪 Gera"),
    (680.0, "🇩🇪 Zwickau"),
    (715.0, "🇩🇪 Chemnitz"),
    (750.0, "🇩🇪 Dresden"),
    (785.0, "🇩🇪 Görlitz"),
    (830.0, "🇵🇱 Legnica"),
    (890.0, "🇵🇱 Breslau (Wrocław)"),
    (1060.0, "🇵🇱 Kattowitz"),
    (1130.0, "🇵🇱 Krakau"),
    (1360.0, "🇺🇦 Lwiw (Lemberg)"),
    (1500.0, "🇺🇦 Ternopil"),
    (40075.0, TARGET_PLACE),
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RouteError {
    #[error("A route needs at least two milestones, got {0}")]
    TooShort(usize),
    #[error("Milestone '{0}' has a non-finite or negative distance")]
    InvalidDistance(String),
    #[error("Milestone '{place}' at {km} km comes before its predecessor at {previous_km} km")]
    Descending {
        place: String,
        km: f64,
        previous_km: f64,
    },
}

/// A waypoint on the virtual route.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Milestone {
    /// Cumulative distance from the route origin
    pub distance_km: f64,
    /// Place label
    pub place: String,
}

/// An ordered milestone sequence with at least two entries, ascending by
/// distance. Equal neighbouring distances are tolerated.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    milestones: Vec<Milestone>,
}

impl Route {
    pub fn new(milestones: Vec<Milestone>) -> Result<Self, RouteError> {
        if milestones.len() < 2 {
            return Err(RouteError::TooShort(milestones.len()));
        }
        for (i, m) in milestones.iter().enumerate() {
            if !m.distance_km.is_finite() || m.distance_km < 0.0 {
                return Err(RouteError::InvalidDistance(m.place.clone()));
            }
            if i > 0 {
                let previous_km = milestones[i - 1].distance_km;
                if m.distance_km < previous_km {
                    return Err(RouteError::Descending {
                        place: m.place.clone(),
                        km: m.distance_km,
                        previous_km,
                    });
                }
                if m.distance_km == previous_km {
                    tracing::warn!(
                        "Milestones '{}' and '{}' share distance {} km",
                        milestones[i - 1].place,
                        m.place,
                        m.distance_km
                    );
                }
            }
        }
        Ok(Self { milestones })
    }

    pub fn from_table(table: &[(f64, &str)]) -> Result<Self, RouteError> {
        Self::new(
            table
                .iter()
                .map(|&(distance_km, place)| Milestone {
                    distance_km,
                    place: place.to_string(),
                })
                .collect(),
        )
    }

    /// The built-in route with its sentinel moved to `target_km`.
    ///
    /// Places at or past the target are dropped, so a short target still
    /// yields an ascending route.
    pub fn builtin(target_km: f64) -> Result<Self, RouteError> {
        let mut milestones: Vec<Milestone> = DEFAULT_ROUTE[..DEFAULT_ROUTE.len() - 1]
            .iter()
            .filter(|&&(km, _)| km < target_km)
            .map(|&(distance_km, place)| Milestone {
                distance_km,
                place: place.to_string(),
            })
            .collect();
        milestones.push(Milestone {
            distance_km: target_km,
            place: TARGET_PLACE.to_string(),
        });
        Self::new(milestones)
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Distance of the last milestone.
    pub fn length_km(&self) -> f64 {
        self.milestones[self.milestones.len() - 1].distance_km
    }
}

/// Where a cumulative distance lands on a route.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Progress {
    /// Distance this progress was resolved for
    pub cumulative_km: f64,
    /// Last milestone reached
    pub current_place: String,
    pub current_km: f64,
    /// Next milestone; `None` once the final milestone is reached
    pub next_place: Option<String>,
    /// Cumulative distance of the next milestone
    pub next_km: Option<f64>,
    /// Distance left to the next milestone (0 at the end of the route)
    pub km_remaining: f64,
    /// Progress through the current segment, 0.0 to 1.0
    pub fraction: f64,
}

/// Resolve a cumulative distance against a route.
///
/// The current milestone is the rightmost one whose distance is `<=
/// cumulative_km`, so a distance exactly on a milestone selects that
/// milestone. Distances before the first milestone resolve to the first.
/// Negative and NaN inputs are treated as zero.
pub fn resolve(cumulative_km: f64, route: &Route) -> Progress {
    let km = if cumulative_km > 0.0 { cumulative_km } else { 0.0 };
    let milestones = route.milestones();

    let reached = milestones.partition_point(|m| m.distance_km <= km);
    let current_idx = reached.saturating_sub(1);
    let current = &milestones[current_idx];

    match milestones.get(current_idx + 1) {
        Some(next) => {
            let segment = next.distance_km - current.distance_km;
            let fraction = if segment > 0.0 {
                ((km - current.distance_km) / segment).clamp(0.0, 1.0)
            } else {
                1.0
            };
            Progress {
                cumulative_km: km,
                current_place: current.place.clone(),
                current_km: current.distance_km,
                next_place: Some(next.place.clone()),
                next_km: Some(next.distance_km),
                km_remaining: (next.distance_km - km).max(0.0),
                fraction,
            }
        }
        None => Progress {
            cumulative_km: km,
            current_place: current.place.clone(),
            current_km: current.distance_km,
            next_place: None,
            next_km: None,
            km_remaining: 0.0,
            fraction: 1.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_stops() -> Route {
        Route::from_table(&[(0.0, "Home"), (30.0, "CityA"), (60.0, "CityB")]).unwrap()
    }

    #[test]
    fn test_resolve_mid_segment() {
        let p = resolve(45.0, &three_stops());
        assert_eq!(p.current_place, "CityA");
        assert_eq!(p.next_place.as_deref(), Some("CityB"));
        assert_eq!(p.km_remaining, 15.0);
        assert_eq!(p.fraction, 0.5);
        assert_eq!(p.next_km, Some(60.0));
    }

    #[test]
    fn test_resolve_exact_threshold_is_inclusive() {
        let p = resolve(30.0, &three_stops());
        assert_eq!(p.current_place, "CityA");
        assert_eq!(p.next_place.as_deref(), Some("CityB"));
        assert_eq!(p.km_remaining, 30.0);
        assert_eq!(p.fraction, 0.0);
    }

    #[test]
    fn test_resolve_zero_is_first_segment() {
        let p = resolve(0.0, &three_stops());
        assert_eq!(p.current_place, "Home");
        assert_eq!(p.next_place.as_deref(), Some("CityA"));
        assert_eq!(p.km_remaining, 30.0);
        assert_eq!(p.fraction, 0.0);
    }

    #[test]
    fn test_resolve_on_final_milestone() {
        let p = resolve(60.0, &three_stops());
        assert_eq!(p.current_place, "CityB");
        assert_eq!(p.next_place, None);
        assert_eq!(p.km_remaining, 0.0);
        assert_eq!(p.fraction, 1.0);
    }

    #[test]
    fn test_resolve_beyond_final_milestone() {
        let p = resolve(1_000_000.0, &three_stops());
        assert_eq!(p.current_place, "CityB");
        assert_eq!(p.next_place, None);
        assert_eq!(p.next_km, None);
        assert_eq!(p.km_remaining, 0.0);
        assert_eq!(p.fraction, 1.0);
    }

    #[test]
    fn test_resolve_negative_and_nan_treated_as_zero() {
        for km in [-12.0, f64::NAN] {
            let p = resolve(km, &three_stops());
            assert_eq!(p.current_place, "Home");
            assert_eq!(p.cumulative_km, 0.0);
            assert_eq!(p.fraction, 0.0);
        }
    }

    #[test]
    fn test_resolve_before_offset_origin() {
        let route = Route::from_table(&[(10.0, "Start"), (20.0, "End")]).unwrap();
        let p = resolve(4.0, &route);
        assert_eq!(p.current_place, "Start");
        assert_eq!(p.km_remaining, 16.0);
        assert_eq!(p.fraction, 0.0);
    }

    #[test]
    fn test_resolve_duplicate_milestones_last_match_wins() {
        let route = Route::from_table(&[
            (0.0, "Home"),
            (30.0, "CityA"),
            (30.0, "CityA bis"),
            (60.0, "CityB"),
        ])
        .unwrap();
        let p = resolve(30.0, &route);
        assert_eq!(p.current_place, "CityA bis");
        assert_eq!(p.next_place.as_deref(), Some("CityB"));
        assert_eq!(p.fraction, 0.0);
    }

    #[test]
    fn test_resolve_zero_length_segment_fraction_is_one() {
        let route =
            Route::from_table(&[(10.0, "Start"), (10.0, "Start bis"), (20.0, "End")]).unwrap();
        let p = resolve(4.0, &route);
        assert_eq!(p.current_place, "Start");
        assert_eq!(p.next_place.as_deref(), Some("Start bis"));
        assert_eq!(p.fraction, 1.0);
        assert_eq!(p.km_remaining, 6.0);
    }

    #[test]
    fn test_resolve_bounds_hold_across_default_route() {
        let route = Route::builtin(40075.0).unwrap();
        let mut km = 0.0;
        while km < 45_000.0 {
            let p = resolve(km, &route);
            assert!(p.km_remaining >= 0.0, "km_remaining at {km}");
            assert!((0.0..=1.0).contains(&p.fraction), "fraction at {km}");
            assert!(p.current_km <= km);
            km += 7.3;
        }
    }

    #[test]
    fn test_default_route_empty_state() {
        let route = Route::builtin(40075.0).unwrap();
        let p = resolve(0.0, &route);
        assert_eq!(p.current_place, "🏠 Kettenis");
        assert_eq!(p.next_place.as_deref(), Some("🇧🇪 Verviers"));
        assert_eq!(p.km_remaining, 18.0);
        assert_eq!(route.length_km(), 40075.0);
        assert_eq!(route, Route::from_table(DEFAULT_ROUTE).unwrap());
    }

    #[test]
    fn test_builtin_route_ends_at_target() {
        let route = Route::builtin(50_000.0).unwrap();
        let last = &route.milestones()[route.milestones().len() - 1];
        assert_eq!(last.distance_km, 50_000.0);
        assert_eq!(last.place, TARGET_PLACE);
        assert_eq!(route.milestones().len(), DEFAULT_ROUTE.len());
        assert_eq!(resolve(50_000.0, &route).fraction, 1.0);
    }

    #[test]
    fn test_builtin_route_short_target_drops_later_places() {
        let route = Route::builtin(100.0).unwrap();
        let places: Vec<&str> = route.milestones().iter().map(|m| m.place.as_str()).collect();
        assert_eq!(
            places,
            vec![
                "🏠 Kettenis",
                "🇧🇪 Verviers",
                "🇧🇪 Lüttich (Liège)",
                "🇧🇪 Tongeren",
                TARGET_PLACE
            ]
        );
        assert_eq!(route.length_km(), 100.0);
        assert!(Route::builtin(f64::NAN).is_err());
    }

    #[test]
    fn test_route_validation() {
        assert_eq!(
            Route::from_table(&[(0.0, "Only")]).unwrap_err(),
            RouteError::TooShort(1)
        );
        assert!(matches!(
            Route::from_table(&[(0.0, "A"), (20.0, "B"), (10.0, "C")]).unwrap_err(),
            RouteError::Descending { .. }
        ));
        assert!(matches!(
            Route::from_table(&[(0.0, "A"), (f64::INFINITY, "B")]).unwrap_err(),
            RouteError::InvalidDistance(_)
        ));
    }
}
