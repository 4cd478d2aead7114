//! Fuzz target for Payload::from_frame
//!
//! Valid headers for every opcode around arbitrary bodies:
//! - Malformed CBOR
//! - Wrong body shape for the opcode
//! - Non-empty bodies on bodiless opcodes
//!
//! Must never panic. Whatever decodes must re-encode to an equal payload.

#![no_main]

use bytes::Bytes;
use chorus_proto::{Frame, FrameHeader, Opcode, Payload};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for opcode in Opcode::ALL {
        let frame = Frame::new(FrameHeader::new(opcode), Bytes::copy_from_slice(data));

        if let Ok(payload) = Payload::from_frame(&frame) {
            assert_eq!(payload.opcode(), opcode);

            let reencoded = payload.clone().into_frame().expect("decoded payload must encode");
            assert_eq!(Payload::from_frame(&reencoded).expect("re-encoded payload must decode"), payload);
        }
    }
});
