//! Frame types and encode/decode.

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use types::{ActorId, Message};

/// Upper bound on one frame's payload. Frames carry a tiny enum; anything
/// near this limit indicates a desynchronized or hostile stream.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Size of the big-endian length prefix preceding every payload.
pub const LEN_PREFIX_BYTES: usize = 4;

/// Everything that travels on a peer link.
///
/// `Hello` is sent exactly once by the connection initiator so the acceptor
/// learns which actor is on the other end. Every later frame is an `Event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireFrame {
    Hello { actor: ActorId },
    Event(Message),
}

/// Encode a frame as length prefix + bincode payload, ready to write.
pub fn encode_frame(frame: &WireFrame) -> Result<Vec<u8>> {
    let payload = bincode::serialize(frame).map_err(|source| CodecError::Serialize { source })?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(CodecError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_BYTES,
        });
    }
    let mut buf = Vec::with_capacity(LEN_PREFIX_BYTES + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode the payload that followed a length prefix.
pub fn decode_payload(payload: &[u8]) -> Result<WireFrame> {
    bincode::deserialize(payload).map_err(|source| CodecError::Deserialize { source })
}

/// Validate a received length prefix before allocating for the payload.
pub fn check_frame_len(len: usize) -> Result<()> {
    if len > MAX_FRAME_BYTES {
        return Err(CodecError::FrameTooLarge {
            len,
            max: MAX_FRAME_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_frame_round_trips() {
        let frame = WireFrame::Event(Message::new(ActorId::new(3), 17));
        let bytes = encode_frame(&frame).unwrap();

        let len = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(len, bytes.len() - LEN_PREFIX_BYTES);
        assert_eq!(decode_payload(&bytes[4..]).unwrap(), frame);
    }

    #[test]
    fn hello_frame_round_trips() {
        let frame = WireFrame::Hello {
            actor: ActorId::new(42),
        };
        let bytes = encode_frame(&frame).unwrap();
        assert_eq!(decode_payload(&bytes[4..]).unwrap(), frame);
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let err = decode_payload(&[0xFF; 16]).unwrap_err();
        assert!(matches!(err, CodecError::Deserialize { .. }));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let err = check_frame_len(MAX_FRAME_BYTES + 1).unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
        assert!(check_frame_len(MAX_FRAME_BYTES).is_ok());
    }

    #[test]
    fn frames_are_self_delimiting_in_a_stream() {
        // Two frames back to back decode independently.
        let a = WireFrame::Event(Message::new(ActorId::new(1), 5));
        let b = WireFrame::Event(Message::new(ActorId::new(2), 9));
        let mut stream = encode_frame(&a).unwrap();
        stream.extend(encode_frame(&b).unwrap());

        let len_a = u32::from_be_bytes(stream[..4].try_into().unwrap()) as usize;
        let rest = &stream[4 + len_a..];
        assert_eq!(decode_payload(&stream[4..4 + len_a]).unwrap(), a);

        let len_b = u32::from_be_bytes(rest[..4].try_into().unwrap()) as usize;
        assert_eq!(decode_payload(&rest[4..4 + len_b]).unwrap(), b);
    }
}
