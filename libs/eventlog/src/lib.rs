//! # Tickmesh Event Log
//!
//! Durable history of everything an actor did. [`EventLogger`] appends one
//! line per event to the active segment, rotates segments on a fixed
//! wall-clock interval, and gzips closed segments in the background. The
//! [`reader`] side discovers an actor's segments, compressed or not, and
//! replays them in chronological order for offline analysis.
//!
//! The logger has an explicit `open` / `rotate` / `close` lifecycle; there
//! is no ambient global rotation timer.

pub mod error;
pub mod logger;
pub mod reader;
pub mod segment;

pub use error::{LogError, Result};
pub use logger::{EventLogger, LoggerOptions};
pub use reader::read_actor_log;
pub use segment::SegmentName;
