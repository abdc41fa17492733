//! # Tickmesh Virtual Machine Runtime
//!
//! The per-actor core of the simulation: the fixed-rate tick loop that
//! drains the inbound queue one message per tick, drives the Lamport clock,
//! sends to peers according to the configured event mix, and records every
//! event durably.
//!
//! Layering:
//!
//! - [`picker`]: the explicit discrete-probability table behind each
//!   tick's random draw
//! - [`core`]: pure per-tick state transitions (clock + log entries), no
//!   I/O, fully deterministic under a seeded RNG
//! - [`runtime`]: the `Starting → Running → Stopping → Stopped` state
//!   machine wiring the core to the mesh and the event log
//! - [`fleet`]: bootstrap, binding listeners, assigning rates, and spawning
//!   one runtime per actor

pub mod core;
pub mod fleet;
pub mod picker;
pub mod runtime;

pub use crate::core::{ActorCore, QuietTick};
pub use fleet::{run_fleet, run_single};
pub use picker::{EventPicker, TickAction, TickOutcome};
pub use runtime::{ActorRuntime, ActorSpec, RunState, RunStats};
