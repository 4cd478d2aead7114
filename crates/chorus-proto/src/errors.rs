//! Protocol error types.

use thiserror::Error;

use crate::Opcode;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while framing, parsing or transporting protocol data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer is shorter than a frame header.
    #[error("frame too short: expected {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Header does not start with the chorus magic number.
    #[error("invalid magic number")]
    InvalidMagic,

    /// Header carries a protocol version this build does not speak.
    #[error("unsupported protocol version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// Payload exceeds [`crate::FrameHeader::MAX_PAYLOAD_SIZE`].
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Claimed or actual payload size
        size: usize,
        /// Protocol limit
        max: usize,
    },

    /// Fewer payload bytes than the header claims.
    #[error("frame truncated: expected {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload bytes claimed by the header
        expected: usize,
        /// Payload bytes present
        actual: usize,
    },

    /// Opcode value is not assigned.
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),

    /// Opcode is valid but not allowed in this position (e.g. a server
    /// `Line` sent by a client, or a request before the handshake).
    #[error("unexpected opcode: {0:?}")]
    UnexpectedOpcode(Opcode),

    /// CBOR serialization failed.
    #[error("CBOR encode error: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed.
    #[error("CBOR decode error: {0}")]
    CborDecode(String),

    /// Underlying stream failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Peer closed the stream cleanly between frames.
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::ConnectionClosed
        } else {
            Self::Io(err.to_string())
        }
    }
}
