//! CBOR-encoded protocol payloads.
//!
//! Frame headers are raw binary, payloads use CBOR for type safety. The
//! [`Payload`] enum covers every frame type; which variant a frame holds is
//! decided by the header opcode, so the CBOR body carries no variant tag.
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one opcode (enforced by match
//! exhaustiveness).

pub mod chat;

use bytes::BufMut;
use serde::de::DeserializeOwned;

use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Username handshake
    Hello(chat::Hello),
    /// User listing request
    UserList,
    /// Chat text
    Text(chat::Text),
    /// Graceful disconnect
    Logout,
    /// History request
    History,
    /// Server-delivered line
    Line(chat::Line),
}

impl Payload {
    /// Handshake payload for `username`.
    pub fn hello(username: impl Into<String>) -> Self {
        Self::Hello(chat::Hello { username: username.into() })
    }

    /// Delivered line payload.
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(chat::Line { text: text.into() })
    }

    /// Opcode corresponding to this payload type.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Hello(_) => Opcode::Hello,
            Self::UserList => Opcode::UserList,
            Self::Text(_) => Opcode::Text,
            Self::Logout => Opcode::Logout,
            Self::History => Opcode::History,
            Self::Line(_) => Opcode::Line,
        }
    }

    /// Encode payload to buffer.
    ///
    /// Serializes only the inner struct, NOT the variant tag. Size limits are
    /// enforced later by [`Frame::encode`].
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        match self {
            Self::Hello(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Text(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Line(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::UserList | Self::Logout | Self::History => Ok(()),
        }
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
    }

    /// Decode payload from bytes based on opcode.
    ///
    /// The size check happens before CBOR parsing so the parser never sees an
    /// oversized input. Zero-byte opcodes reject non-empty bodies.
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: bytes.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        let payload = match opcode {
            Opcode::Hello => Self::Hello(from_cbor(bytes)?),
            Opcode::Text => Self::Text(from_cbor(bytes)?),
            Opcode::Line => Self::Line(from_cbor(bytes)?),
            Opcode::UserList => empty(bytes, Self::UserList)?,
            Opcode::Logout => empty(bytes, Self::Logout)?,
            Opcode::History => empty(bytes, Self::History)?,
        };

        Ok(payload)
    }

    /// Convert payload into a transport frame.
    pub fn into_frame(self) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(Frame::new(FrameHeader::new(self.opcode()), buf))
    }

    /// Parse payload from a raw transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownOpcode` if the header opcode is unassigned
    /// - `ProtocolError::CborDecode` if CBOR deserialization fails
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame
            .header
            .opcode_enum()
            .ok_or_else(|| ProtocolError::UnknownOpcode(frame.header.opcode()))?;
        Self::decode(opcode, &frame.payload)
    }
}

fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

fn empty(bytes: &[u8], payload: Payload) -> Result<Payload> {
    if bytes.is_empty() {
        Ok(payload)
    } else {
        Err(ProtocolError::CborDecode(format!(
            "{:?} carries no body, got {} bytes",
            payload.opcode(),
            bytes.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trip() {
        let payload = Payload::hello("alice");

        let frame = payload.clone().into_frame().expect("should create frame");
        assert_eq!(frame.header.opcode_enum(), Some(Opcode::Hello));

        let decoded = Payload::from_frame(&frame).expect("should parse payload");
        assert_eq!(payload, decoded);
    }

    #[test]
    fn bodiless_payloads_encode_to_nothing() {
        for payload in [Payload::UserList, Payload::Logout, Payload::History] {
            let frame = payload.clone().into_frame().unwrap();
            assert!(frame.payload.is_empty());
            assert_eq!(Payload::from_frame(&frame).unwrap(), payload);
        }
    }

    #[test]
    fn bodiless_opcode_with_body_is_rejected() {
        let frame = Frame::new(FrameHeader::new(Opcode::Logout), vec![0xA0]);
        assert!(matches!(Payload::from_frame(&frame), Err(ProtocolError::CborDecode(_))));
    }

    #[test]
    fn garbage_cbor_is_rejected() {
        let frame = Frame::new(FrameHeader::new(Opcode::Text), vec![0xFF, 0x00, 0x13]);
        assert!(matches!(Payload::from_frame(&frame), Err(ProtocolError::CborDecode(_))));
    }

    #[test]
    fn wrong_shape_for_opcode_is_rejected() {
        // A bare CBOR integer where a Hello map is expected
        let frame = Frame::new(FrameHeader::new(Opcode::Hello), vec![0x01]);
        assert!(matches!(Payload::from_frame(&frame), Err(ProtocolError::CborDecode(_))));
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut bytes = FrameHeader::new(Opcode::Text).to_bytes();
        bytes[6..8].copy_from_slice(&0x0777u16.to_be_bytes());
        let frame = Frame::decode(&bytes).unwrap();

        assert_eq!(Payload::from_frame(&frame), Err(ProtocolError::UnknownOpcode(0x0777)));
    }
}
