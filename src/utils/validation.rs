//! Value checks applied to decoded measurements and derived quantities.

/// Returns the value if it is a finite float.
#[inline]
pub fn validate_finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Validate an oracle exchange rate.
///
/// A round answering zero has not been initialised (or was reset), so it
/// carries no price at all. Returns `Some(rate)` only for finite positive rates.
#[inline]
pub fn validate_oracle_rate(rate: f64) -> Option<f64> {
    if rate > 0.0 && rate.is_finite() {
        Some(rate)
    } else {
        None
    }
}
