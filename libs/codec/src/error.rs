//! Codec errors.
//!
//! Decode failure is never recoverable at this layer: the caller must treat
//! the stream as corrupt (skipping bytes would desynchronize framing).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Declared frame length exceeds the protocol maximum. A tickmesh frame
    /// is a handful of bytes; a huge length prefix means stream corruption.
    #[error("frame of {len} bytes exceeds maximum {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("failed to serialize frame: {source}")]
    Serialize { source: bincode::Error },

    #[error("failed to decode frame payload: {source}")]
    Deserialize { source: bincode::Error },
}

pub type Result<T> = std::result::Result<T, CodecError>;
