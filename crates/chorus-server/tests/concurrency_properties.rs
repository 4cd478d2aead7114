//! Concurrent senders: every live session sees every broadcast exactly once,
//! all in the same order, with each sender's own order preserved.

mod common;

use std::collections::HashMap;

use chorus_server::{ChaoticLog, MemoryLog};
use common::{start, start_with_log, untimed, within};

const CLIENTS: usize = 4;
const MESSAGES: usize = 25;

/// Run `CLIENTS` clients each sending `MESSAGES` lines concurrently and
/// return what each one received.
async fn exchange<L: chorus_server::LogSink>(server: &common::TestServer<L>) -> Vec<Vec<String>> {
    let mut clients = Vec::new();
    for c in 0..CLIENTS {
        clients.push(server.join(&format!("c{c}")).await);
    }

    let mut readers = Vec::new();
    let mut writers = Vec::new();
    for (_c, client) in clients.into_iter().enumerate() {
        let (mut tx, mut rx) = client.into_split();

        readers.push(tokio::spawn(async move {
            let mut received = Vec::with_capacity(CLIENTS * MESSAGES);
            for _ in 0..CLIENTS * MESSAGES {
                received.push(untimed(&rx.recv_line().await.unwrap()).to_string());
            }
            received
        }));

        writers.push(tokio::spawn(async move {
            for m in 0..MESSAGES {
                tx.send(chorus_proto::Message::Text(format!("m{m}"))).await.unwrap();
            }
            tx
        }));
    }

    // Keep write halves alive until every reader is done
    let mut senders = Vec::new();
    for writer in writers {
        senders.push(within(writer).await.unwrap());
    }

    let mut received = Vec::new();
    for reader in readers {
        received.push(within(reader).await.unwrap());
    }
    drop(senders);
    received
}

fn assert_consistent(received: &[Vec<String>]) {
    let reference = &received[0];

    for other in received {
        assert_eq!(other, reference, "sessions saw different broadcast orders");
    }

    let mut per_sender: HashMap<&str, Vec<&str>> = HashMap::new();
    for line in reference {
        let (sender, text) = line.split_once(": ").unwrap();
        per_sender.entry(sender).or_default().push(text);
    }

    assert_eq!(per_sender.len(), CLIENTS);
    let expected: Vec<String> = (0..MESSAGES).map(|m| format!("m{m}")).collect();
    for (sender, texts) in per_sender {
        assert_eq!(texts, expected, "{sender} lines out of order or missing");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_broadcasts_are_totally_ordered() {
    let server = start().await;

    let received = exchange(&server).await;

    assert_consistent(&received);
    let logged = chorus_server::LogSink::all(&server.log).unwrap();
    let chat: Vec<&str> = logged.iter().map(|l| untimed(l)).filter(|l| l.contains(">: ")).collect();
    assert_eq!(chat, received[0].iter().map(String::as_str).collect::<Vec<_>>());

    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_log_never_blocks_delivery() {
    let server = start_with_log(ChaoticLog::with_seed(MemoryLog::new(), 0.5, 7)).await;

    let received = exchange(&server).await;

    assert_consistent(&received);
    assert!(server.log.inner().len() < server.log.operation_count());

    server.stop().await.unwrap();
}
