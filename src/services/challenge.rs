//! Head-to-head comparison of the two riders.

use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::services::normalize::Rider;

/// Who is ahead in the challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leader {
    Rider(Rider),
    Tie,
}

impl Serialize for Leader {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Leader::Rider(rider) => serializer.serialize_str(rider.tag()),
            Leader::Tie => serializer.serialize_str("tie"),
        }
    }
}

/// Challenge standings. The percentages measure each rider's own all-time
/// distance against the circumnavigation target and are unrelated to the
/// segment fraction of route progress.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Challenge {
    #[schema(value_type = String, example = "Alexandre")]
    pub leader: Leader,
    /// Absolute gap between the riders' all-time totals
    pub difference_km: f64,
    pub alexandre_km: f64,
    pub oswald_km: f64,
    /// Alexandre's share of the target, capped at 100
    pub alexandre_pct: f64,
    /// Oswald's share of the target, capped at 100
    pub oswald_pct: f64,
    pub target_km: f64,
}

/// Compare the riders' all-time totals against each other and the target.
pub fn challenge(total_alexandre: f64, total_oswald: f64, target_km: f64) -> Challenge {
    let leader = if total_alexandre > total_oswald {
        Leader::Rider(Rider::Alexandre)
    } else if total_oswald > total_alexandre {
        Leader::Rider(Rider::Oswald)
    } else {
        Leader::Tie
    };

    Challenge {
        leader,
        difference_km: (total_alexandre - total_oswald).abs(),
        alexandre_km: total_alexandre,
        oswald_km: total_oswald,
        alexandre_pct: target_pct(total_alexandre, target_km),
        oswald_pct: target_pct(total_oswald, target_km),
        target_km,
    }
}

fn target_pct(total_km: f64, target_km: f64) -> f64 {
    if target_km <= 0.0 || !total_km.is_finite() {
        return 0.0;
    }
    (total_km / target_km * 100.0).clamp(0.0, 100.0)
}
