//! Chorus wire protocol.
//!
//! Every unit on the wire is a [`Frame`]: a fixed 12-byte [`FrameHeader`]
//! followed by a CBOR payload whose type is named by the header's [`Opcode`].
//! The header carries everything needed to split the byte stream into frames,
//! so a reader never has to understand a payload to stay in sync.
//!
//! # Components
//!
//! - [`FrameHeader`]: zero-copy binary header (magic, version, opcode, size)
//! - [`Frame`]: header plus raw payload bytes
//! - [`Payload`]: typed view of a frame's payload, one variant per opcode
//! - [`Message`]: the four client requests the server dispatches on
//! - [`io`]: async helpers reading and writing frames on a byte stream

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod errors;
mod frame;
mod header;
pub mod io;
mod message;
mod opcode;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use message::Message;
pub use opcode::Opcode;
pub use payloads::Payload;
