//! USER_LIST and HISTORY replies go to the requester only.

mod common;

use chorus_proto::Message;
use chorus_server::RULE;
use common::{assert_quiet, line, start, untimed};

#[tokio::test]
async fn user_list_lists_registry_to_requester_only() {
    let server = start().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    bob.send(Message::UserList).await.unwrap();

    let header = line(&mut bob).await;
    assert!(header.starts_with(&format!("\n{RULE}\nList of the users currently connected at ")));

    let first = line(&mut bob).await;
    let second = line(&mut bob).await;
    assert!(first.starts_with("1) <alice>: connected since "), "{first}");
    assert!(second.starts_with("2) <bob>: connected since "), "{second}");

    let since = server.registry.snapshot()[0].connected_at().format("%a %b %d %H:%M:%S %Y").to_string();
    assert_eq!(first, format!("1) <alice>: connected since {since}"));

    assert_eq!(line(&mut bob).await, RULE);
    assert_quiet(&mut alice).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn history_replays_log_to_requester_only() {
    let server = start().await;
    let mut alice = server.join("alice").await;
    let mut bob = server.join("bob").await;

    alice.say("one").await.unwrap();
    line(&mut alice).await;
    line(&mut bob).await;
    bob.say("two").await.unwrap();
    line(&mut alice).await;
    line(&mut bob).await;

    alice.send(Message::History).await.unwrap();

    assert_eq!(line(&mut alice).await, format!("\n{RULE}\nPrinting chatlog history..."));

    let mut replayed = Vec::new();
    loop {
        let next = line(&mut alice).await;
        if next == format!("\n{RULE}") {
            break;
        }
        replayed.push(untimed(&next).to_string());
    }

    assert_eq!(
        replayed,
        vec![
            format!("Server waiting for Clients on port {}.", server.addr.port()),
            "<alice> just connected.".to_string(),
            "<bob> just connected.".to_string(),
            "<alice>: one".to_string(),
            "<bob>: two".to_string(),
        ]
    );
    assert_quiet(&mut bob).await;

    server.stop().await.unwrap();
}

#[tokio::test]
async fn history_after_reset_is_only_this_run() {
    let server = start().await;
    let mut alice = server.join("alice").await;

    alice.send(Message::History).await.unwrap();

    assert_eq!(line(&mut alice).await, format!("\n{RULE}\nPrinting chatlog history..."));
    assert!(untimed(&line(&mut alice).await).starts_with("Server waiting for Clients"));
    assert_eq!(untimed(&line(&mut alice).await), "<alice> just connected.");
    assert_eq!(line(&mut alice).await, format!("\n{RULE}"));

    server.stop().await.unwrap();
}
