//! Message policy: what each client request does.
//!
//! [`Dispatcher::handle`] is called once per received message by the
//! sender's processing unit. Every call runs under one turn lock, so
//! broadcasts and replies from different sessions are applied one at a time
//! in lock order: each registry snapshot plus its sends completes before the
//! next begins. A peer that stops reading holds the turn for at most
//! [`SEND_TIMEOUT`](crate::session::SEND_TIMEOUT) per line.
//!
//! | message   | effect                                                       |
//! |-----------|--------------------------------------------------------------|
//! | TEXT      | timestamp + attribute, log, show, broadcast to every session |
//! | LOGOUT    | log a disconnect notice, tell the unit to stop               |
//! | USER_LIST | bordered listing of the registry, to the requester only      |
//! | HISTORY   | bordered replay of the chat log, to the requester only       |
//!
//! Chat log failures are reported and never hold back delivery.

use std::sync::Arc;

use chorus_proto::Message;
use tokio::sync::Mutex;

use crate::{
    env::Environment,
    event::EventSink,
    log::LogSink,
    registry::Registry,
    session::{DeliveryError, Session, encode_line},
};

/// Border around USER_LIST and HISTORY replies.
pub const RULE: &str = "------------------------------------------------------------------------";

/// Timestamp prefix of chat and event lines.
const TIME_FORMAT: &str = "%H:%M:%S";

/// Connect time in USER_LIST rows.
const CONNECTED_SINCE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// What the processing unit does after a message is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,
    /// The client logged out; close the session.
    Logout,
}

/// Applies message semantics against the registry.
pub struct Dispatcher<L: LogSink, E: Environment> {
    registry: Registry,
    log: L,
    events: Arc<dyn EventSink>,
    env: E,
    turn: Mutex<()>,
}

impl<L: LogSink, E: Environment> Dispatcher<L, E> {
    /// Create a dispatcher over `registry`.
    pub fn new(registry: Registry, log: L, events: Arc<dyn EventSink>, env: E) -> Self {
        Self { registry, log, events, env, turn: Mutex::new(()) }
    }

    /// Registry this dispatcher delivers to.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Chat log this dispatcher writes to.
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Apply one message from `session`.
    pub async fn handle(&self, session: &Arc<Session>, message: Message) -> Flow {
        let _turn = self.turn.lock().await;

        match message {
            Message::Text(text) => {
                let line = format!("{} <{}>: {text}", self.timestamp(), session.name());
                self.persist(&line);
                self.events.append_room(&line);
                self.broadcast(&line).await;
                Flow::Continue
            },
            Message::Logout => {
                self.emit_event(&format!("{} disconnected with a LOGOUT message.", session.name()));
                Flow::Logout
            },
            Message::UserList => {
                let lines = self.user_list();
                self.reply(session, &lines).await;
                Flow::Continue
            },
            Message::History => {
                match self.log.all() {
                    Ok(stored) => {
                        let lines = history(stored);
                        self.reply(session, &lines).await;
                    },
                    Err(e) => {
                        tracing::warn!("chat log read failed: {e}");
                        self.emit_event(&format!("Unable to read chat log for {}: {e}", session.name()));
                    },
                }
                Flow::Continue
            },
        }
    }

    /// Timestamp, log and show an operational event line.
    pub fn emit_event(&self, message: &str) {
        let line = format!("{} {message}", self.timestamp());
        self.persist(&line);
        self.events.append_event(&line);
    }

    fn timestamp(&self) -> String {
        self.env.now().format(TIME_FORMAT).to_string()
    }

    fn persist(&self, line: &str) {
        if let Err(e) = self.log.append(line) {
            tracing::warn!("chat log append failed: {e}");
            self.events.append_event(&format!("{} Unable to store line in chat log: {e}", self.timestamp()));
        }
    }

    /// Deliver `line` to every registered session.
    ///
    /// Sessions that fail or stall are removed after the pass, not during
    /// it. A session already removed by someone else is not reported again.
    async fn broadcast(&self, line: &str) {
        let encoded = match encode_line(line) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("broadcast line not deliverable: {e}");
                return;
            },
        };

        let mut failed = Vec::new();
        for session in self.registry.snapshot() {
            if let Err(e) = session.send(&encoded).await {
                tracing::debug!("broadcast delivery failed: {e}");
                failed.push(session);
            }
        }

        for session in failed {
            if self.registry.remove(session.id()).is_some() {
                session.close();
                self.emit_event(&format!("Unresponsive client {} removed.", session.name()));
            }
        }
    }

    /// Deliver `lines` to `session` only.
    ///
    /// Stops at the first failure and reports it; the session stays
    /// registered.
    async fn reply(&self, session: &Session, lines: &[String]) {
        for line in lines {
            let result = match encode_line(line) {
                Ok(encoded) => session.send(&encoded).await,
                Err(e) => {
                    tracing::warn!("reply line not deliverable: {e}");
                    continue;
                },
            };

            if let Err(e) = result {
                match &e {
                    DeliveryError::Unreachable(_) => tracing::debug!("{e}"),
                    DeliveryError::Write { .. } | DeliveryError::Stalled(_) => tracing::warn!("{e}"),
                }
                self.emit_event(&format!("Error sending message to {}", session.name()));
                return;
            }
        }
    }

    fn user_list(&self) -> Vec<String> {
        let mut lines =
            vec![format!("\n{RULE}\nList of the users currently connected at {}", self.timestamp())];

        lines.extend(self.registry.snapshot().iter().enumerate().map(|(i, session)| {
            format!(
                "{}) <{}>: connected since {}",
                i + 1,
                session.name(),
                session.connected_at().format(CONNECTED_SINCE_FORMAT)
            )
        }));

        lines.push(RULE.to_string());
        lines
    }
}

fn history(stored: Vec<String>) -> Vec<String> {
    let mut lines = Vec::with_capacity(stored.len() + 2);
    lines.push(format!("\n{RULE}\nPrinting chatlog history..."));
    lines.extend(stored);
    lines.push(format!("\n{RULE}"));
    lines
}
