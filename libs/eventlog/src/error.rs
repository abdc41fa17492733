//! Event log errors.
//!
//! A write failure that survives its bounded retries is fatal: an actor
//! whose log cannot be trusted must not keep producing unverifiable history.

use std::path::PathBuf;
use thiserror::Error;
use types::LogEntryParseError;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to write log entry to {} after {attempts} attempts: {source}", path.display())]
    Write {
        path: PathBuf,
        attempts: u32,
        source: std::io::Error,
    },

    #[error("failed to rotate log segment {}: {source}", path.display())]
    Rotate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to compress log segment {}: {source}", path.display())]
    Compress {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bad log line {line} in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        source: LogEntryParseError,
    },

    #[error("log I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LogError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogError>;
