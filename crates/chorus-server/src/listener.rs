//! Accept loop and per-connection tasks.
//!
//! The accept loop owns the TCP listener and a [`JoinSet`] of connection
//! tasks. Each task performs the username handshake, registers a fresh
//! [`Session`] and runs its processing unit. Stopping the server cancels one
//! token: the accept loop returns, every session token (a child of it) fires,
//! and readers and in-flight writes give up.

use std::{
    net::SocketAddr,
    time::Duration,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    net::{TcpListener, TcpStream},
    task::{JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;

use crate::{
    ServerError,
    dispatcher::Dispatcher,
    env::Environment,
    log::LogSink,
    session::{self, Session, SessionId, SessionState},
};

/// Pause before accepting again after a failed accept.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Shared by every connection task.
struct Context<L: LogSink, E: Environment> {
    dispatcher: Arc<Dispatcher<L, E>>,
    env: E,
    next_id: AtomicU64,
    cancel: CancellationToken,
}

impl<L: LogSink, E: Environment> Context<L, E> {
    fn assign_id(&self) -> SessionId {
        SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Accept connections until `cancel` fires, then close every session.
///
/// # Errors
///
/// - `ServerError::Internal` if a registry invariant breaks or a connection
///   task dies. The server stops in that case.
pub(crate) async fn serve<L, E>(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<L, E>>,
    env: E,
    cancel: CancellationToken,
) -> Result<(), ServerError>
where
    L: LogSink,
    E: Environment,
{
    let port = listener.local_addr()?.port();
    let ctx = Arc::new(Context { dispatcher, env, next_id: AtomicU64::new(1), cancel });
    let mut tasks: JoinSet<Result<(), ServerError>> = JoinSet::new();
    let mut outcome = Ok(());

    ctx.dispatcher.emit_event(&format!("Server waiting for Clients on port {port}."));

    loop {
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = flatten(joined) {
                    tracing::error!("connection task failed: {e}");
                    outcome = Err(e);
                    break;
                }
            },
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    tracing::debug!(%addr, "connection accepted");
                    tasks.spawn(connection(stream, addr, Arc::clone(&ctx)));
                },
                Err(e) => {
                    tracing::warn!("accept failed: {e}");
                    backoff(&ctx.cancel).await;
                },
            },
        }
    }

    drop(listener);
    ctx.cancel.cancel();

    let sessions = ctx.dispatcher.registry().drain();
    tracing::info!(sessions = sessions.len(), "closing sessions");
    for session in &sessions {
        session.close();
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = flatten(joined) {
            tracing::error!("connection task failed during shutdown: {e}");
            if outcome.is_ok() {
                outcome = Err(e);
            }
        }
    }

    ctx.dispatcher.emit_event("Server stopped.");
    outcome
}

/// Pause after a failed accept so persistent errors (fd exhaustion) do not
/// spin the loop. Returns early on shutdown.
async fn backoff(cancel: &CancellationToken) {
    tokio::select! {
        () = cancel.cancelled() => {},
        () = tokio::time::sleep(ACCEPT_BACKOFF) => {},
    }
}

fn flatten(joined: Result<Result<(), ServerError>, JoinError>) -> Result<(), ServerError> {
    joined.map_err(|e| ServerError::Internal(format!("connection task aborted: {e}")))?
}

/// Handshake, register, run the processing unit.
async fn connection<L, E>(stream: TcpStream, addr: SocketAddr, ctx: Arc<Context<L, E>>) -> Result<(), ServerError>
where
    L: LogSink,
    E: Environment,
{
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(%addr, "set_nodelay failed: {e}");
    }
    let (mut reader, writer) = stream.into_split();
    let mut state = SessionState::Connecting;

    let name = match session::handshake(&mut reader, &ctx.cancel).await {
        Ok(name) => name,
        Err(e) => {
            state.advance(SessionState::Closed);
            if !ctx.cancel.is_cancelled() {
                ctx.dispatcher.emit_event(&format!("Error creating new I/O streams for {addr}: {e}"));
            }
            return Ok(());
        },
    };

    let session = Arc::new(Session::new(
        ctx.assign_id(),
        name,
        ctx.env.now(),
        writer,
        ctx.cancel.child_token(),
    ));

    if let Err(e) = ctx.dispatcher.registry().add(Arc::clone(&session)) {
        state.advance(SessionState::Closed);
        return Err(e.into());
    }
    state.advance(SessionState::Active);
    tracing::info!(session_id = %session.id(), name = session.name(), %addr, "session registered");
    ctx.dispatcher.emit_event(&format!("<{}> just connected.", session.name()));

    let state = session::run_session(session, reader, Arc::clone(&ctx.dispatcher), state).await;
    debug_assert_eq!(state, SessionState::Closed);
    Ok(())
}
