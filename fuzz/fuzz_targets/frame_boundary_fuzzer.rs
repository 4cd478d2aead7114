//! Fuzz target for frame header boundary conditions
//!
//! # Strategy
//!
//! - Magic bytes: valid, off-by-one, all-zeros, all-ones, random
//! - Payload size: zero, small, at-max, just-over-max, `u32::MAX`
//! - Version: valid (0x01), zero, max, random
//! - Opcode: assigned and unassigned values
//!
//! # Invariants
//!
//! - `payload_size > MAX_PAYLOAD_SIZE` MUST return `PayloadTooLarge`
//! - Invalid magic MUST return `InvalidMagic`
//! - Unknown version MUST return `UnsupportedVersion`
//! - A decoded frame re-encodes to exactly `12 + payload_size` bytes

#![no_main]

use arbitrary::Arbitrary;
use chorus_proto::{Frame, FrameHeader, ProtocolError};
use libfuzzer_sys::fuzz_target;

const MAGIC: [u8; 4] = FrameHeader::MAGIC.to_be_bytes();

#[derive(Debug, Clone, Arbitrary)]
struct BoundaryFrame {
    magic: MagicBytes,
    version: VersionByte,
    opcode: u16,
    payload_size: PayloadSize,
    body: Vec<u8>,
}

#[derive(Debug, Clone, Arbitrary)]
enum MagicBytes {
    Valid,
    OffByOne(u8),
    AllZeros,
    AllOnes,
    Random([u8; 4]),
}

#[derive(Debug, Clone, Arbitrary)]
enum VersionByte {
    Valid,
    Zero,
    Max,
    Random(u8),
}

#[derive(Debug, Clone, Arbitrary)]
enum PayloadSize {
    Zero,
    BodyLength,
    AtMax,
    JustOverMax,
    MaxU32,
    Random(u32),
}

impl BoundaryFrame {
    fn magic(&self) -> [u8; 4] {
        match &self.magic {
            MagicBytes::Valid => MAGIC,
            MagicBytes::OffByOne(i) => {
                let mut magic = MAGIC;
                let idx = (*i as usize) % 4;
                magic[idx] = magic[idx].wrapping_add(1);
                magic
            },
            MagicBytes::AllZeros => [0; 4],
            MagicBytes::AllOnes => [0xFF; 4],
            MagicBytes::Random(bytes) => *bytes,
        }
    }

    fn version(&self) -> u8 {
        match self.version {
            VersionByte::Valid => FrameHeader::VERSION,
            VersionByte::Zero => 0,
            VersionByte::Max => u8::MAX,
            VersionByte::Random(v) => v,
        }
    }

    fn payload_size(&self) -> u32 {
        match self.payload_size {
            PayloadSize::Zero => 0,
            PayloadSize::BodyLength => u32::try_from(self.body.len()).unwrap_or(u32::MAX),
            PayloadSize::AtMax => FrameHeader::MAX_PAYLOAD_SIZE,
            PayloadSize::JustOverMax => FrameHeader::MAX_PAYLOAD_SIZE + 1,
            PayloadSize::MaxU32 => u32::MAX,
            PayloadSize::Random(size) => size,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FrameHeader::SIZE + self.body.len());
        bytes.extend_from_slice(&self.magic());
        bytes.push(self.version());
        bytes.push(0);
        bytes.extend_from_slice(&self.opcode.to_be_bytes());
        bytes.extend_from_slice(&self.payload_size().to_be_bytes());
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

fuzz_target!(|input: BoundaryFrame| {
    let bytes = input.to_bytes();
    let result = Frame::decode(&bytes);

    if input.magic() != MAGIC {
        assert!(matches!(result, Err(ProtocolError::InvalidMagic)), "bad magic accepted: {result:?}");
        return;
    }

    if input.version() != FrameHeader::VERSION {
        assert!(
            matches!(result, Err(ProtocolError::UnsupportedVersion(_))),
            "bad version accepted: {result:?}"
        );
        return;
    }

    if input.payload_size() > FrameHeader::MAX_PAYLOAD_SIZE {
        assert!(
            matches!(result, Err(ProtocolError::PayloadTooLarge { .. })),
            "oversized frame accepted: {result:?}"
        );
        return;
    }

    if let Ok(frame) = result {
        assert_eq!(frame.payload.len(), input.payload_size() as usize);

        let mut encoded = Vec::new();
        frame.encode(&mut encoded).expect("decoded frame must re-encode");
        assert_eq!(encoded.len(), FrameHeader::SIZE + input.payload_size() as usize);
        assert_eq!(encoded[..], bytes[..encoded.len()]);
    }
});
