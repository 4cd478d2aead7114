//! Shared harness: a real server on an ephemeral localhost port.

#![allow(dead_code)]

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use chorus_client::{ChatClient, ClientError};
use chorus_server::{
    EventSink, LogSink, MemoryEventSink, MemoryLog, Registry, Server, ServerConfig, ServerError, ServerHandle,
    SessionId, SystemEnv,
};
use tokio::task::JoinHandle;

/// Upper bound for anything a test waits on.
pub const DEADLINE: Duration = Duration::from_secs(10);

/// How long "nothing arrives" is observed for.
pub const QUIET: Duration = Duration::from_millis(200);

pub struct TestServer<L: LogSink> {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
    pub registry: Registry,
    pub log: L,
    pub events: Arc<MemoryEventSink>,
    task: JoinHandle<Result<(), ServerError>>,
}

pub async fn start() -> TestServer<MemoryLog> {
    start_with_log(MemoryLog::new()).await
}

pub async fn start_with_log<L: LogSink>(log: L) -> TestServer<L> {
    let config = ServerConfig { bind_address: "127.0.0.1:0".to_string(), reset_log: true };
    let events = Arc::new(MemoryEventSink::new());
    let server = Server::bind(config, log.clone(), Arc::clone(&events) as Arc<dyn EventSink>, SystemEnv::new())
        .await
        .unwrap();

    let addr = server.local_addr().unwrap();
    let handle = server.handle();
    let registry = server.registry();
    let task = tokio::spawn(server.run());

    TestServer { addr, handle, registry, log, events, task }
}

/// Await `fut`, failing the test if it takes longer than [`DEADLINE`].
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(DEADLINE, fut).await.expect("timed out")
}

/// Poll `condition` until it holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

impl<L: LogSink> TestServer<L> {
    /// Connect and wait until the session is registered, so ids follow call
    /// order.
    pub async fn join(&self, name: &str) -> ChatClient {
        let before = self.registry.len();
        let client = within(ChatClient::connect(self.addr, name)).await.unwrap();
        eventually(|| self.registry.len() > before).await;
        client
    }

    pub fn registered(&self) -> Vec<(SessionId, String)> {
        self.registry.snapshot().iter().map(|s| (s.id(), s.name().to_string())).collect()
    }

    pub async fn wait_for_event(&self, needle: &str) {
        eventually(|| self.events.events().iter().any(|line| line.contains(needle))).await;
    }

    pub async fn stop(self) -> Result<(), ServerError> {
        self.handle.stop();
        within(self.task).await.unwrap()
    }
}

/// Next delivered line, within [`DEADLINE`].
pub async fn line(client: &mut ChatClient) -> String {
    within(client.recv_line()).await.unwrap()
}

/// Strip the `HH:MM:SS ` prefix.
pub fn untimed(line: &str) -> &str {
    line.split_once(' ').map_or(line, |(_, rest)| rest)
}

/// Assert nothing is delivered for [`QUIET`].
pub async fn assert_quiet(client: &mut ChatClient) {
    let result = tokio::time::timeout(QUIET, client.recv_line()).await;
    assert!(result.is_err(), "unexpected delivery: {result:?}");
}

pub fn is_closed(result: &Result<String, ClientError>) -> bool {
    matches!(result, Err(ClientError::Closed | ClientError::Protocol(_)))
}
