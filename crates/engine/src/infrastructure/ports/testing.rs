//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Uniform integer in `min..=max`.
    fn gen_range(&self, min: i64, max: i64) -> i64;
    /// Uniform float in `[0, 1)`.
    fn gen_unit(&self) -> f64;
    fn gen_uuid(&self) -> Uuid;
    /// 64 hex chars of secure randomness.
    fn gen_token(&self) -> String;
}
