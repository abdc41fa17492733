//! The read-side of the event log, used by tests and the offline analysis
//! tooling. Discovers an actor's segments in a directory, orders them by
//! encoded start time, transparently decompresses the gzipped ones, and
//! parses every line back into [`LogEntry`] records.

use crate::error::{LogError, Result};
use crate::segment::SegmentName;
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use types::{ActorId, LogEntry};

/// All of one actor's entries, across every segment, in chronological order.
pub fn read_actor_log(dir: impl AsRef<Path>, actor: ActorId) -> Result<Vec<LogEntry>> {
    let dir = dir.as_ref();
    let mut entries = Vec::new();
    for (compressed, path) in discover_segments(dir, actor)?.into_values() {
        read_segment(&path, compressed, &mut entries)?;
    }
    Ok(entries)
}

/// Segment files for one actor, ordered by start time then sequence. If both
/// a `.log` and a `.log.gz` exist for the same name (a compression that died
/// before removing the original), the uncompressed file wins: it is the one
/// the logger finished writing.
fn discover_segments(
    dir: &Path,
    actor: ActorId,
) -> Result<BTreeMap<SegmentName, (bool, PathBuf)>> {
    let mut segments: BTreeMap<SegmentName, (bool, PathBuf)> = BTreeMap::new();
    let listing = std::fs::read_dir(dir).map_err(|e| LogError::io(dir, e))?;
    for item in listing {
        let item = item.map_err(|e| LogError::io(dir, e))?;
        let file_name = item.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some((name, compressed)) = SegmentName::parse(file_name) else {
            continue;
        };
        if name.actor != actor {
            continue;
        }
        match segments.get(&name) {
            Some((false, _)) => {} // uncompressed already present, keep it
            _ => {
                segments.insert(name, (compressed, item.path()));
            }
        }
    }
    Ok(segments)
}

fn read_segment(path: &Path, compressed: bool, out: &mut Vec<LogEntry>) -> Result<()> {
    let file = File::open(path).map_err(|e| LogError::io(path, e))?;
    let reader: Box<dyn Read> = if compressed {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|e| LogError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = LogEntry::parse_line(&line).map_err(|source| LogError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        out.push(entry);
    }
    Ok(())
}
