//! Property-based tests for frame boundaries on a byte stream
//!
//! A reader must recover exactly the sequence of messages a writer sent,
//! whatever the text contains and however many frames share one buffer.

use chorus_proto::{Frame, Message, io};
use proptest::prelude::*;

fn arbitrary_message() -> impl Strategy<Value = Message> {
    prop_oneof![
        Just(Message::UserList),
        Just(Message::Logout),
        Just(Message::History),
        ".{0,200}".prop_map(Message::Text),
    ]
}

#[test]
fn prop_stream_preserves_message_sequence() {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    proptest!(|(messages in prop::collection::vec(arbitrary_message(), 0..32))| {
        let received = runtime.block_on(async {
            let mut wire: Vec<u8> = Vec::new();
            for message in &messages {
                let frame = message.clone().into_frame().unwrap();
                io::write_frame(&mut wire, &frame).await.unwrap();
            }

            let mut reader = wire.as_slice();
            let mut received = Vec::new();
            while !reader.is_empty() {
                let frame: Frame = io::read_frame(&mut reader).await.unwrap();
                received.push(Message::from_frame(&frame).unwrap());
            }
            received
        });

        prop_assert_eq!(received, messages);
    });
}

#[test]
fn prop_concatenated_frames_decode_in_order() {
    proptest!(|(texts in prop::collection::vec(".{0,64}", 1..16))| {
        let mut wire = Vec::new();
        for text in &texts {
            Message::Text(text.clone()).into_frame().unwrap().encode(&mut wire).unwrap();
        }

        let mut offset = 0;
        for text in &texts {
            let frame = Frame::decode(&wire[offset..]).unwrap();
            offset += frame.encoded_len();
            prop_assert_eq!(Message::from_frame(&frame).unwrap(), Message::Text(text.clone()));
        }
        prop_assert_eq!(offset, wire.len());
    });
}
