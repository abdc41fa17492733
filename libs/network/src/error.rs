//! Transport error types.
//!
//! The taxonomy mirrors the failure modes the simulation cares about:
//! establishment failure (fatal during startup), a link breaking mid-run
//! (fatal to the run, since delivery is assumed reliable), and decode
//! failure (treated as a broken link, never skipped).

use codec::CodecError;
use thiserror::Error;
use types::ActorId;

#[derive(Debug, Error)]
pub enum TransportError {
    /// A peer connection could not be formed during startup, after the
    /// bounded retry budget was spent.
    #[error("failed to establish link to actor {peer} after {attempts} attempts: {source}")]
    Establish {
        peer: ActorId,
        attempts: u32,
        source: std::io::Error,
    },

    /// The peer on an accepted connection did not identify itself properly.
    #[error("handshake failed: {message}")]
    Handshake { message: String },

    /// An established link dropped mid-run.
    #[error("link to actor {peer} broken: {message}")]
    LinkBroken { peer: ActorId, message: String },

    /// Malformed bytes arrived on a link. The link is treated as broken;
    /// resynchronizing would corrupt the ordering contract.
    #[error("decode failure on link to actor {peer}: {source}")]
    Decode { peer: ActorId, source: CodecError },

    #[error("I/O error: {message}")]
    Io {
        message: String,
        source: std::io::Error,
    },
}

impl TransportError {
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    pub fn link_broken(peer: ActorId, message: impl Into<String>) -> Self {
        Self::LinkBroken {
            peer,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Peer the error concerns, when it concerns exactly one.
    pub fn peer(&self) -> Option<ActorId> {
        match self {
            Self::Establish { peer, .. }
            | Self::LinkBroken { peer, .. }
            | Self::Decode { peer, .. } => Some(*peer),
            Self::Handshake { .. } | Self::Io { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
