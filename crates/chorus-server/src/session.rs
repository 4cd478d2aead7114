//! Connected clients and their processing units.
//!
//! A [`Session`] is the server-side half of one client connection: its id,
//! display name, connect time and the write half of its transport. The read
//! half never leaves the processing unit spawned for the session, which loops
//! "read one message, hand it to the dispatcher" until the client logs out,
//! the read fails, or the session is closed.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting --handshake ok--> Active --logout / read error--> Closing --> Closed
//!      |                                                                    ^
//!      +-------------------------handshake failed---------------------------+
//! ```

use std::{fmt, sync::Arc, time::Duration};

use chorus_proto::{Frame, Message, Payload, ProtocolError, io};
use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    dispatcher::{Dispatcher, Flow},
    env::Environment,
    log::LogSink,
};

/// How long closing a session waits for its transport to shut down.
pub const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// How long one write may block before the delivery counts as failed.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-unique session identifier.
///
/// Assigned from a monotonically increasing counter; never reused while the
/// process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a session could not be established or kept reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No valid username arrived before the first message.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Transport read or frame decode failed on an active session.
    #[error("{0}")]
    Read(String),
}

/// Why a line did not reach a session.
///
/// Soft failures: the dispatcher decides whether the session is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The session was already closed before the write started.
    #[error("session {0} is not connected")]
    Unreachable(SessionId),

    /// The transport write failed.
    #[error("write to session {session} failed: {reason}")]
    Write {
        /// Session the write was aimed at
        session: SessionId,
        /// Transport error text
        reason: String,
    },

    /// The peer did not accept the line within [`SEND_TIMEOUT`].
    #[error("write to session {0} timed out")]
    Stalled(SessionId),
}

/// Processing-unit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport accepted, waiting for the username.
    Connecting,
    /// Registered and reading messages.
    Active,
    /// Leaving the registry and releasing the transport.
    Closing,
    /// Terminal.
    Closed,
}

impl SessionState {
    /// Whether `self -> next` is a legal move.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Active | Self::Closed)
                | (Self::Active, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    /// Move to `next`. Illegal moves trip a debug assertion.
    pub fn advance(&mut self, next: Self) {
        debug_assert!(self.can_transition_to(next), "illegal session transition {self:?} -> {next:?}");
        tracing::trace!(from = ?*self, to = ?next, "session state");
        *self = next;
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One connected client.
///
/// Shared as `Arc<Session>` between its processing unit and the registry.
/// Removing it from the registry does not close it; closing cancels its token,
/// which stops the reader and fails any write in progress.
pub struct Session {
    id: SessionId,
    name: String,
    connected_at: DateTime<Local>,
    writer: Mutex<BoxedWriter>,
    cancel: CancellationToken,
}

impl Session {
    /// Create a session around the write half of its transport.
    pub fn new<W>(
        id: SessionId,
        name: impl Into<String>,
        connected_at: DateTime<Local>,
        writer: W,
        cancel: CancellationToken,
    ) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            name: name.into(),
            connected_at,
            writer: Mutex::new(Box::new(writer)),
            cancel,
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display name given at handshake.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the handshake completed.
    pub fn connected_at(&self) -> DateTime<Local> {
        self.connected_at
    }

    /// Whether the transport is still usable.
    pub fn is_connected(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Mark the session closed. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the session is closed.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }

    /// Write one pre-encoded frame.
    ///
    /// # Errors
    ///
    /// - `DeliveryError::Unreachable` if the session is closed before or
    ///   while waiting for its writer
    /// - `DeliveryError::Write` if the transport write fails
    /// - `DeliveryError::Stalled` if the write blocks past [`SEND_TIMEOUT`]
    ///
    /// Never closes the session; whoever called decides what a failure means.
    pub async fn send(&self, encoded: &[u8]) -> Result<(), DeliveryError> {
        if !self.is_connected() {
            return Err(DeliveryError::Unreachable(self.id));
        }

        let write = async {
            let mut writer = self.writer.lock().await;
            writer.write_all(encoded).await?;
            writer.flush().await
        };

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(DeliveryError::Unreachable(self.id)),
            result = tokio::time::timeout(SEND_TIMEOUT, write) => result,
        };

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DeliveryError::Write { session: self.id, reason: e.to_string() }),
            Err(_) => Err(DeliveryError::Stalled(self.id)),
        }
    }

    /// Best-effort transport shutdown, bounded by [`CLOSE_TIMEOUT`].
    pub async fn shutdown(&self) {
        let shutdown = async {
            let mut writer = self.writer.lock().await;
            writer.shutdown().await
        };

        match tokio::time::timeout(CLOSE_TIMEOUT, shutdown).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => tracing::debug!(session_id = %self.id, "transport shutdown failed: {e}"),
            Err(_) => tracing::debug!(session_id = %self.id, "transport shutdown timed out"),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("connected_at", &self.connected_at)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Encode a delivered line once so a broadcast can reuse the bytes.
///
/// # Errors
///
/// - `ProtocolError::PayloadTooLarge` if the line does not fit in one frame
pub fn encode_line(line: &str) -> Result<Vec<u8>, ProtocolError> {
    let frame: Frame = Payload::line(line).into_frame()?;
    let mut buf = Vec::with_capacity(frame.encoded_len());
    frame.encode(&mut buf)?;
    Ok(buf)
}

/// Read the username sent immediately after connecting.
///
/// Returns the trimmed name. Anything but a non-empty `Hello` frame fails.
pub async fn handshake<R>(reader: &mut R, cancel: &CancellationToken) -> Result<String, SessionError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let frame = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(SessionError::Handshake("server stopping".to_string())),
        frame = io::read_frame(reader) => frame.map_err(|e| SessionError::Handshake(e.to_string()))?,
    };

    match Payload::from_frame(&frame).map_err(|e| SessionError::Handshake(e.to_string()))? {
        Payload::Hello(hello) => {
            let name = hello.username.trim();
            if name.is_empty() {
                Err(SessionError::Handshake("empty username".to_string()))
            } else {
                Ok(name.to_string())
            }
        },
        other => Err(SessionError::Handshake(format!("expected Hello, got {:?}", other.opcode()))),
    }
}

/// Read one message, honouring session closure.
///
/// `Ok(None)` means the session was closed while waiting.
async fn next_message<R>(session: &Session, reader: &mut R) -> Result<Option<Message>, SessionError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    tokio::select! {
        biased;
        () = session.closed() => Ok(None),
        frame = io::read_frame(reader) => {
            let message = frame
                .and_then(|frame| Message::from_frame(&frame))
                .map_err(|e| SessionError::Read(e.to_string()))?;
            Ok(Some(message))
        },
    }
}

/// Processing unit for one registered session.
///
/// Takes over an `Active` session, runs until logout, read failure or
/// closure, then removes the session from the registry and releases its
/// transport. Returns the final state, which is always `Closed`.
pub async fn run_session<R, L, E>(
    session: Arc<Session>,
    mut reader: R,
    dispatcher: Arc<Dispatcher<L, E>>,
    mut state: SessionState,
) -> SessionState
where
    R: AsyncRead + Unpin,
    L: LogSink,
    E: Environment,
{
    let span = tracing::info_span!("session", session_id = %session.id(), name = session.name());

    async move {
        debug_assert_eq!(state, SessionState::Active, "processing unit started before registration");

        loop {
            match next_message(&session, &mut reader).await {
                Ok(Some(message)) => {
                    tracing::debug!(tag = message.tag(), "message received");
                    if dispatcher.handle(&session, message).await == Flow::Logout {
                        break;
                    }
                },
                Ok(None) => {
                    tracing::debug!("session closed while reading");
                    break;
                },
                Err(e) => {
                    // Closed sessions already had their failure reported
                    if session.is_connected() {
                        dispatcher.emit_event(&format!("{} Exception reading Streams: {e}", session.name()));
                    }
                    break;
                },
            }
        }

        state.advance(SessionState::Closing);
        dispatcher.registry().remove(session.id());
        session.close();
        session.shutdown().await;
        state.advance(SessionState::Closed);
        state
    }
    .instrument(span)
    .await
}
