//! The one message type actors exchange.

use crate::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A timestamped message: the sender's identity and the logical clock value
/// it carried at send time. Immutable once constructed; produced by exactly
/// one send event and consumed by exactly one receive event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: ActorId,
    pub clock: u64,
}

impl Message {
    pub fn new(sender: ActorId, clock: u64) -> Self {
        Message { sender, clock }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg(sender={}, clock={})", self.sender, self.clock)
    }
}
