//! # Tickmesh Wire Codec
//!
//! Framing and (de)serialization for peer links. A frame on the wire is a
//! `u32` big-endian length prefix followed by a bincode-encoded
//! [`WireFrame`]. The length prefix makes frames self-delimiting on a byte
//! stream; bincode makes the payload unambiguous. Total ordering within one
//! stream is the transport's job (`network`), not the codec's.
//!
//! This crate is pure over byte buffers: it never touches a socket, which
//! keeps the encoding testable without I/O.

pub mod error;
pub mod frame;

pub use error::{CodecError, Result};
pub use frame::{
    check_frame_len, decode_payload, encode_frame, WireFrame, LEN_PREFIX_BYTES, MAX_FRAME_BYTES,
};
