//! Segment naming.
//!
//! A segment file name encodes the owning actor and the segment's start
//! time, so logs from a whole fleet can share one directory without
//! collisions and the reader can order segments without opening them:
//!
//! ```text
//! vm_<actor>_<YYYYMMDDTHHMMSS>.log        active or closed-uncompressed
//! vm_<actor>_<YYYYMMDDTHHMMSS>.log.gz     closed and compressed
//! vm_<actor>_<YYYYMMDDTHHMMSS>-<n>.log    nth segment started that second
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use types::ActorId;

const PREFIX: &str = "vm";
const TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
pub const SEGMENT_EXT: &str = "log";
pub const COMPRESSED_EXT: &str = "log.gz";

/// Parsed identity of one segment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SegmentName {
    pub actor: ActorId,
    pub start: NaiveDateTime,
    /// Disambiguates multiple segments started within the same second.
    pub seq: u32,
}

impl SegmentName {
    pub fn new(actor: ActorId, start: DateTime<Utc>, seq: u32) -> Self {
        SegmentName {
            actor,
            start: start.naive_utc(),
            seq,
        }
    }

    /// File name of the uncompressed segment.
    pub fn file_name(&self) -> String {
        let stamp = self.start.format(TIME_FORMAT);
        if self.seq == 0 {
            format!("{PREFIX}_{}_{stamp}.{SEGMENT_EXT}", self.actor)
        } else {
            format!("{PREFIX}_{}_{stamp}-{}.{SEGMENT_EXT}", self.actor, self.seq)
        }
    }

    /// Parse a directory entry. Returns the name and whether the file is
    /// compressed; `None` for files that are not tickmesh segments.
    pub fn parse(file_name: &str) -> Option<(SegmentName, bool)> {
        let (stem, compressed) = if let Some(stem) = file_name.strip_suffix(".log.gz") {
            (stem, true)
        } else if let Some(stem) = file_name.strip_suffix(".log") {
            (stem, false)
        } else {
            return None;
        };

        let mut parts = stem.splitn(3, '_');
        if parts.next() != Some(PREFIX) {
            return None;
        }
        let actor: ActorId = parts.next()?.parse().ok()?;
        let stamp = parts.next()?;

        let (stamp, seq) = match stamp.split_once('-') {
            Some((stamp, seq)) => (stamp, seq.parse().ok()?),
            None => (stamp, 0),
        };
        let start = NaiveDateTime::parse_from_str(stamp, TIME_FORMAT).ok()?;

        Some((SegmentName { actor, start, seq }, compressed))
    }
}
