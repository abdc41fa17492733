//! Tick-outcome selection.
//!
//! The random draw is an explicit bucket table built once from the
//! configured weights, not an inferred range mapping: with the default
//! weights (7/1/1/1) the table has ten buckets, three of which are send
//! outcomes, the classic 70/30 split. Peer-slot resolution is deterministic
//! over the ascending-id peer list; with one peer the second slot falls back
//! to the first (matching the original two-peer behavior), and with no peers
//! every send outcome degrades to an internal event.

use config::EventMixConfig;
use rand::Rng;
use types::ActorId;

/// What a quiet tick (no message pending) will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Internal,
    SendFirst,
    SendSecond,
    Broadcast,
}

/// A resolved outcome: either an internal event or a concrete recipient
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    Internal,
    Send(Vec<ActorId>),
}

/// Uniform draw over an explicit bucket table.
#[derive(Debug, Clone)]
pub struct EventPicker {
    buckets: Vec<TickOutcome>,
}

impl EventPicker {
    /// Build the table: send buckets first, internal buckets fill the rest.
    pub fn from_mix(mix: &EventMixConfig) -> Self {
        let mut buckets =
            Vec::with_capacity(mix.total_weight() as usize);
        buckets.extend(std::iter::repeat(TickOutcome::SendFirst).take(mix.send_first as usize));
        buckets.extend(std::iter::repeat(TickOutcome::SendSecond).take(mix.send_second as usize));
        buckets.extend(std::iter::repeat(TickOutcome::Broadcast).take(mix.broadcast as usize));
        buckets.extend(std::iter::repeat(TickOutcome::Internal).take(mix.internal as usize));
        if buckets.is_empty() {
            // pick() draws unconditionally, so the table must never be empty.
            buckets.push(TickOutcome::Internal);
        }
        EventPicker { buckets }
    }

    pub fn buckets(&self) -> &[TickOutcome] {
        &self.buckets
    }

    /// Draw one outcome uniformly.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> TickOutcome {
        self.buckets[rng.gen_range(0..self.buckets.len())]
    }

    /// Resolve an outcome against the actor's peer list (ascending id
    /// order, as the mesh reports it).
    pub fn resolve(outcome: TickOutcome, peers: &[ActorId]) -> TickAction {
        if peers.is_empty() {
            return TickAction::Internal;
        }
        match outcome {
            TickOutcome::Internal => TickAction::Internal,
            TickOutcome::SendFirst => TickAction::Send(vec![peers[0]]),
            // Second slot falls back to the only peer when there is just one.
            TickOutcome::SendSecond => {
                TickAction::Send(vec![*peers.get(1).unwrap_or(&peers[0])])
            }
            TickOutcome::Broadcast => TickAction::Send(peers.to_vec()),
        }
    }
}
