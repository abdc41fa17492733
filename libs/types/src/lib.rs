//! # Tickmesh Core Types
//!
//! Shared type definitions for the Lamport clock simulation:
//!
//! - **Identity**: [`ActorId`] and the per-run [`ClockRate`]
//! - **Time**: [`LamportClock`] with the three Lamport update rules
//! - **Wire payload**: [`Message`], the only thing actors exchange
//! - **History**: [`EventKind`] and [`LogEntry`], the durable record of
//!   every event an actor performs
//!
//! These types carry no I/O. Framing lives in `codec`, transport in
//! `network`, persistence in `eventlog`.

pub mod actor;
pub mod clock;
pub mod event;
pub mod message;

pub use actor::{ActorId, ClockRate, InvalidClockRate};
pub use clock::LamportClock;
pub use event::{EventKind, LogEntry, LogEntryParseError};
pub use message::Message;
