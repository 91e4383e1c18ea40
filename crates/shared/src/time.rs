//! Unix-seconds timestamp conversion.

use chrono::{DateTime, TimeZone, Utc};

/// Seconds since the epoch with sub-second precision.
pub fn to_epoch_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Inverse of [`to_epoch_secs`]. None for non-finite or out-of-range input.
pub fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_micros(micros as i64).single()
}
