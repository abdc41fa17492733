//! Actor identity and tick-rate types.
//!
//! `ActorId` is a plain `u32` wrapper so ids from configuration, wire frames,
//! and log lines cannot be confused with other integers. `ClockRate` is the
//! actor's fixed ticks-per-second value, drawn once at startup and immutable
//! for the run.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Unique identity of one virtual machine within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    pub fn new(id: u32) -> Self {
        ActorId(id)
    }

    pub fn inner(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(ActorId)
    }
}

/// Rate validation failure (zero or outside the configured range).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid clock rate {rate}: must be within {min}..={max} ticks/s")]
pub struct InvalidClockRate {
    pub rate: u32,
    pub min: u32,
    pub max: u32,
}

/// Ticks per second of one actor's event loop.
///
/// Assigned uniformly at random from the configured range (default 1..=6)
/// when the actor starts, then fixed for the lifetime of the run. The
/// heterogeneity of rates across the fleet is what produces the clock drift
/// the simulation exists to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClockRate(u32);

impl ClockRate {
    /// Default lower bound, ticks per second.
    pub const DEFAULT_MIN: u32 = 1;
    /// Default upper bound, ticks per second.
    pub const DEFAULT_MAX: u32 = 6;

    /// Construct a rate, rejecting values outside `min..=max`.
    pub fn new(rate: u32, min: u32, max: u32) -> Result<Self, InvalidClockRate> {
        if rate == 0 || rate < min || rate > max {
            return Err(InvalidClockRate { rate, min, max });
        }
        Ok(ClockRate(rate))
    }

    /// Draw a rate uniformly from `min..=max` with the supplied RNG.
    pub fn draw<R: Rng>(rng: &mut R, min: u32, max: u32) -> Result<Self, InvalidClockRate> {
        if min == 0 || min > max {
            return Err(InvalidClockRate { rate: min, min, max });
        }
        Ok(ClockRate(rng.gen_range(min..=max)))
    }

    pub fn ticks_per_second(self) -> u32 {
        self.0
    }

    /// Nominal interval between ticks. Best-effort target for the loop;
    /// drift under load is a measured quantity, not an error.
    pub fn tick_interval(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0 as f64)
    }
}

impl fmt::Display for ClockRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ticks/s", self.0)
    }
}
