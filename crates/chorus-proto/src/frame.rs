//! Frame type combining header and payload.
//!
//! A `Frame` is the transport-layer unit:
//! - 12-byte raw binary header (Big Endian)
//! - Variable-length raw bytes (already CBOR-encoded)
//!
//! This is a pure data holder. For typed content see `Payload::into_frame()`
//! and `Payload::from_frame()`.

use bytes::{BufMut, Bytes};

use crate::{
    FrameHeader,
    errors::{ProtocolError, Result},
};

/// Complete protocol frame
///
/// Layout on the wire:
/// `[FrameHeader: 12 bytes] + [payload: variable bytes]`
///
/// # Invariants
///
/// - `payload.len()` MUST match `header.payload_size()`. Enforced by
///   [`Frame::new`] and verified by [`Frame::decode`].
/// - `payload.len()` MUST NOT exceed [`FrameHeader::MAX_PAYLOAD_SIZE`].
///   Violations are rejected during encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header
    pub header: FrameHeader,

    /// Raw payload bytes (CBOR-encoded, possibly empty)
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame with automatic `payload_size` calculation.
    ///
    /// Does NOT reject oversized payloads; [`Frame::encode`] does. The size
    /// field saturates at `u32::MAX` so an oversized frame can never claim a
    /// small size.
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let payload_len = u32::try_from(payload.len()).unwrap_or(u32::MAX);

        header.payload_size = payload_len.to_be_bytes();

        Self { header, payload }
    }

    /// Total encoded size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        FrameHeader::SIZE + self.payload.len()
    }

    /// Encode frame into buffer.
    ///
    /// Writes: `[header (12 bytes)] + [payload (variable)]`
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds `MAX_PAYLOAD_SIZE`
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.payload.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        debug_assert_eq!(self.payload.len(), self.header.payload_size() as usize);

        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Decode frame from wire format.
    ///
    /// Returns a Frame with raw bytes (does NOT deserialize the payload).
    /// Trailing bytes after the frame are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError` if header parsing fails (invalid magic, version, or
    ///   size limits)
    /// - `ProtocolError::FrameTruncated` if payload is shorter than the header
    ///   claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;

        let payload_size = header.payload_size() as usize;
        let total_size = FrameHeader::SIZE + payload_size;

        let Some(payload) = bytes.get(FrameHeader::SIZE..total_size) else {
            return Err(ProtocolError::FrameTruncated {
                expected: payload_size,
                actual: bytes.len().saturating_sub(FrameHeader::SIZE),
            });
        };

        Ok(Self { header: *header, payload: Bytes::copy_from_slice(payload) })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Opcode;

    fn any_opcode() -> impl Strategy<Value = Opcode> {
        prop::sample::select(Opcode::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn frame_round_trip(
            opcode in any_opcode(),
            payload in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let frame = Frame::new(FrameHeader::new(opcode), payload);

            let mut wire = Vec::new();
            frame.encode(&mut wire).expect("should encode");
            prop_assert_eq!(wire.len(), frame.encoded_len());

            let parsed = Frame::decode(&wire).expect("should decode");
            prop_assert_eq!(frame, parsed);
        }

        #[test]
        fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = Frame::decode(&bytes);
        }
    }

    #[test]
    fn payload_size_is_set_automatically() {
        let frame = Frame::new(FrameHeader::new(Opcode::Text), vec![1, 2, 3, 4]);
        assert_eq!(frame.header.payload_size(), 4);
    }

    #[test]
    fn reject_truncated_frame() {
        let frame = Frame::new(FrameHeader::new(Opcode::Text), vec![0u8; 100]);
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();

        let result = Frame::decode(&wire[..FrameHeader::SIZE + 10]);
        assert_eq!(result, Err(ProtocolError::FrameTruncated { expected: 100, actual: 10 }));
    }

    #[test]
    fn reject_oversized_payload_on_encode() {
        let payload = vec![0u8; FrameHeader::MAX_PAYLOAD_SIZE as usize + 1];
        let frame = Frame::new(FrameHeader::new(Opcode::Text), payload);

        let mut wire = Vec::new();
        assert!(matches!(frame.encode(&mut wire), Err(ProtocolError::PayloadTooLarge { .. })));
        assert!(wire.is_empty());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let frame = Frame::new(FrameHeader::new(Opcode::Logout), Vec::new());
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();
        wire.extend_from_slice(b"next frame");

        assert_eq!(Frame::decode(&wire).unwrap(), frame);
    }
}
