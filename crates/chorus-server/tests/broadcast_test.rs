//! End-to-end broadcast and session lifecycle over real TCP connections.
//!
//! - A TEXT line reaches every registered session, the sender included
//! - Ids follow connection order and never repeat
//! - LOGOUT removes the session and produces an event, not a chat line
//! - A vanished client is dropped after its read fails

mod common;

use chorus_proto::Message;
use chorus_server::{LogSink, SessionId};
use common::{assert_quiet, eventually, line, start, untimed};

#[tokio::test]
async fn text_reaches_everyone_including_sender() {
    let server = start().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    assert_eq!(
        server.registered(),
        vec![(SessionId::new(1), "alice".to_string()), (SessionId::new(2), "bob".to_string())]
    );

    alice.say("hi").await.unwrap();

    let to_bob = line(&mut bob).await;
    let to_alice = line(&mut alice).await;
    assert_eq!(untimed(&to_bob), "<alice>: hi");
    assert_eq!(to_alice, to_bob);

    assert!(server.log.all().unwrap().contains(&to_bob));
    assert_eq!(server.events.room(), vec![to_bob]);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn logout_removes_session_without_chat_line() {
    let server = start().await;
    let alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.logout().await.unwrap();

    server.wait_for_event("alice disconnected with a LOGOUT message.").await;
    eventually(|| !server.registry.contains(SessionId::new(1))).await;
    assert!(server.registry.contains(SessionId::new(2)));
    assert!(server.events.room().is_empty());
    assert_quiet(&mut bob).await;

    bob.say("anyone?").await.unwrap();
    assert_eq!(untimed(&line(&mut bob).await), "<bob>: anyone?");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn connect_event_is_logged() {
    let server = start().await;
    let _alice = server.join("alice").await;

    server.wait_for_event("<alice> just connected.").await;
    assert!(server.log.all().unwrap().iter().any(|l| l.ends_with("<alice> just connected.")));
    assert!(
        server.events.events()[0].ends_with(&format!("Server waiting for Clients on port {}.", server.addr.port()))
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn dropped_client_is_removed_after_read_failure() {
    let server = start().await;
    let alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    drop(alice);

    eventually(|| server.registry.len() == 1).await;
    server.wait_for_event("alice Exception reading Streams").await;

    bob.say("still here").await.unwrap();
    assert_eq!(untimed(&line(&mut bob).await), "<bob>: still here");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn ids_are_never_reused() {
    let server = start().await;

    let alice = server.join("alice").await;
    alice.logout().await.unwrap();
    eventually(|| server.registry.is_empty()).await;

    let _again = server.join("alice").await;

    assert_eq!(server.registered(), vec![(SessionId::new(2), "alice".to_string())]);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn bad_handshake_is_never_registered() {
    let server = start().await;

    // First frame must be the username
    let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
    let frame = Message::Text("no name".into()).into_frame().unwrap();
    chorus_proto::io::write_frame(&mut stream, &frame).await.unwrap();

    server.wait_for_event("Error creating new I/O streams").await;
    assert!(server.registry.is_empty());

    // Next successful client still gets id 1
    let _alice = server.join("alice").await;
    assert_eq!(server.registered(), vec![(SessionId::new(1), "alice".to_string())]);

    server.stop().await.unwrap();
}
