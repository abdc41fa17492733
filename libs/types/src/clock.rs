//! Lamport logical clock.
//!
//! One counter per actor, owned exclusively by its tick loop. The three
//! update rules are the whole algorithm:
//!
//! - internal event: `c' = c + 1`
//! - send event:     `c' = c + 1` (the sent message carries `c'`)
//! - receive of `r`: `c' = max(c, r) + 1`
//!
//! The counter is `u64`, so a negative received value cannot be represented;
//! invalid input is excluded at the type level rather than checked at
//! runtime.

use serde::{Deserialize, Serialize};

/// Monotonic logical clock following Lamport's update rules.
///
/// Not `Sync`-guarded: the tick loop is the sole writer by construction, so
/// no lock is ever taken around it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LamportClock(u64);

impl LamportClock {
    pub fn new() -> Self {
        LamportClock(0)
    }

    /// Current counter value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Rule for an internal event. Returns the new value.
    pub fn advance_internal(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Rule for a send event. The returned value is what the outgoing
    /// message must carry.
    pub fn advance_on_send(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Rule for a receive event carrying the sender's clock `received`.
    /// The result is strictly greater than both the prior local value and
    /// `received`.
    pub fn advance_on_receive(&mut self, received: u64) -> u64 {
        self.0 = self.0.max(received) + 1;
        self.0
    }
}
