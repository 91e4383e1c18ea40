//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn gen_token(&self) -> String {
        // ThreadRng is a CSPRNG
        let bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(bytes)
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed random for testing.
#[cfg(test)]
pub struct FixedRandom {
    pub int: i64,
    pub unit: f64,
}

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_range(&self, min: i64, max: i64) -> i64 {
        self.int.clamp(min, max.max(min))
    }

    fn gen_unit(&self) -> f64 {
        self.unit
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }

    fn gen_token(&self) -> String {
        "0".repeat(64)
    }
}
