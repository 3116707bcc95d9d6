//! Shared helpers for Decimal ↔ f64 conversions.
//!
//! The hosted table stores distances as `NUMERIC(10,1)`; rides are rounded
//! to that precision before any backend sees them, so a ride reads back
//! with exactly the distance it was written with.
//!
//! Non-finite inputs (NaN, ±Inf) convert to zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert an f64 to Decimal, rounded to 1 decimal place.
pub(crate) fn f64_to_decimal_1dp(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_1dp received non-finite value {}, defaulting to 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_str_exact(&format!("{:.1}", v)).unwrap_or_default()
}

/// Convert a Decimal to f64, defaulting to 0.0 for values that can't be represented.
pub(crate) fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Round a distance to the 0.1 km storage precision.
pub(crate) fn round_km(v: f64) -> f64 {
    dec_to_f64(f64_to_decimal_1dp(v))
}
