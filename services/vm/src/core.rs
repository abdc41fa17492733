//! Pure per-tick state transitions.
//!
//! `ActorCore` owns the Lamport clock and the event picker and turns each
//! tick into log entries plus (for send outcomes) outgoing messages. It
//! never touches a socket, a file, or the wall clock beyond timestamping
//! entries, so every tick rule is testable deterministically with a seeded
//! RNG.

use crate::picker::{EventPicker, TickAction};
use chrono::Utc;
use rand::Rng;
use types::{ActorId, EventKind, LamportClock, LogEntry, Message};

/// Result of a tick on which no message was pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuietTick {
    Internal {
        entry: LogEntry,
    },
    /// One message value fanned out to `targets`; one log entry per
    /// recipient.
    Send {
        message: Message,
        targets: Vec<ActorId>,
        entries: Vec<LogEntry>,
    },
}

/// Clock, picker, and RNG for one actor.
#[derive(Debug)]
pub struct ActorCore<R: Rng> {
    id: ActorId,
    clock: LamportClock,
    picker: EventPicker,
    rng: R,
}

impl<R: Rng> ActorCore<R> {
    pub fn new(id: ActorId, picker: EventPicker, rng: R) -> Self {
        ActorCore {
            id,
            clock: LamportClock::new(),
            picker,
            rng,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn clock_value(&self) -> u64 {
        self.clock.value()
    }

    /// Receive rule: `queue_len_before` is the queue length observed before
    /// the message was popped, which is what the log records.
    pub fn on_receive(&mut self, message: Message, queue_len_before: usize) -> LogEntry {
        let clock = self.clock.advance_on_receive(message.clock);
        LogEntry {
            wall_time: Utc::now(),
            clock,
            kind: EventKind::Receive,
            queue_len: queue_len_before,
            peer: Some(message.sender),
        }
    }

    /// Quiet-tick rule: draw an outcome and resolve it against the peer
    /// list. Send outcomes advance the clock once and stamp every recipient
    /// with the same value.
    pub fn on_quiet_tick(&mut self, peers: &[ActorId], queue_len: usize) -> QuietTick {
        let outcome = self.picker.pick(&mut self.rng);
        match EventPicker::resolve(outcome, peers) {
            TickAction::Internal => {
                let clock = self.clock.advance_internal();
                QuietTick::Internal {
                    entry: LogEntry {
                        wall_time: Utc::now(),
                        clock,
                        kind: EventKind::Internal,
                        queue_len,
                        peer: None,
                    },
                }
            }
            TickAction::Send(targets) => {
                let clock = self.clock.advance_on_send();
                let message = Message::new(self.id, clock);
                let entries = targets
                    .iter()
                    .map(|&peer| LogEntry {
                        wall_time: Utc::now(),
                        clock,
                        kind: EventKind::Send,
                        queue_len,
                        peer: Some(peer),
                    })
                    .collect();
                QuietTick::Send {
                    message,
                    targets,
                    entries,
                }
            }
        }
    }
}
