//! Fuzz target for Frame::decode and Message::from_frame
//!
//! Arbitrary bytes as they would arrive from a client socket. Decoding must
//! never panic; every invalid input is an error.

#![no_main]

use chorus_proto::{Frame, Message};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Frame::decode(data) {
        let _ = Message::from_frame(&frame);
    }
});
