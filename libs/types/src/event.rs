//! Event records: what an actor did on one tick.
//!
//! Every tick produces at least one [`LogEntry`], serialized as a single
//! text line with a fixed field order so the offline analysis tooling can
//! parse segments without any schema negotiation:
//!
//! ```text
//! <ISO-8601 UTC timestamp> <logical clock> <KIND> <queue length> <peer|->
//! 2026-08-29T10:15:00.123456Z 7 SEND 0 2
//! ```
//!
//! The queue length is the pre-event length (for RECEIVE, the backlog before
//! the pop). The peer column is `-` for INTERNAL events.

use crate::ActorId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of event an actor performed on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Internal,
    Send,
    Receive,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Internal => "INTERNAL",
            EventKind::Send => "SEND",
            EventKind::Receive => "RECEIVE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = LogEntryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INTERNAL" => Ok(EventKind::Internal),
            "SEND" => Ok(EventKind::Send),
            "RECEIVE" => Ok(EventKind::Receive),
            other => Err(LogEntryParseError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Log line parse failure with enough context to locate the bad field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogEntryParseError {
    #[error("log line has {got} fields, expected 5: {line:?}")]
    FieldCount { got: usize, line: String },

    #[error("unknown event kind {kind:?}")]
    UnknownKind { kind: String },

    #[error("bad {field} field {value:?}")]
    BadField { field: &'static str, value: String },
}

/// One appended record of one event. Never mutated after write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time the event was performed.
    pub wall_time: DateTime<Utc>,
    /// Logical clock value *after* the event.
    pub clock: u64,
    pub kind: EventKind,
    /// Inbound queue length observed before the event acted on the queue.
    pub queue_len: usize,
    /// Remote actor involved; `Some` exactly for SEND and RECEIVE.
    pub peer: Option<ActorId>,
}

impl LogEntry {
    /// Render the stable single-line format described in the module docs.
    pub fn to_line(&self) -> String {
        let peer = match self.peer {
            Some(p) => p.to_string(),
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {} {}",
            self.wall_time.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.clock,
            self.kind,
            self.queue_len,
            peer,
        )
    }

    /// Parse one line produced by [`LogEntry::to_line`].
    pub fn parse_line(line: &str) -> Result<Self, LogEntryParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(LogEntryParseError::FieldCount {
                got: fields.len(),
                line: line.to_string(),
            });
        }

        let wall_time = DateTime::parse_from_rfc3339(fields[0])
            .map_err(|_| LogEntryParseError::BadField {
                field: "timestamp",
                value: fields[0].to_string(),
            })?
            .with_timezone(&Utc);

        let clock = fields[1]
            .parse::<u64>()
            .map_err(|_| LogEntryParseError::BadField {
                field: "clock",
                value: fields[1].to_string(),
            })?;

        let kind = fields[2].parse::<EventKind>()?;

        let queue_len = fields[3]
            .parse::<usize>()
            .map_err(|_| LogEntryParseError::BadField {
                field: "queue_len",
                value: fields[3].to_string(),
            })?;

        let peer = match fields[4] {
            "-" => None,
            raw => Some(raw.parse::<ActorId>().map_err(|_| {
                LogEntryParseError::BadField {
                    field: "peer",
                    value: raw.to_string(),
                }
            })?),
        };

        Ok(LogEntry {
            wall_time,
            clock,
            kind,
            queue_len,
            peer,
        })
    }
}
