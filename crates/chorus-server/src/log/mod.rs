//! Chat log abstraction.
//!
//! Every chat and event line the server produces is appended to a
//! [`LogSink`], and a HISTORY request replays the whole log. The trait is
//! synchronous: appends are small and the broadcast path never waits on
//! anything but client sockets.

mod chaotic;
mod memory;
mod redb;

pub use chaotic::ChaoticLog;
pub use memory::MemoryLog;
use thiserror::Error;

pub use self::redb::RedbLog;

/// Errors from a log backend.
///
/// None of these ever block chat delivery; the server reports them and
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// Backend I/O or transaction failure.
    #[error("log I/O error: {0}")]
    Io(String),

    /// Failure injected by [`ChaoticLog`].
    #[error("injected log failure")]
    Injected,
}

/// Append-only store for formatted lines.
///
/// Must be Clone (shared between the dispatcher and the runtime), Send +
/// Sync, and tolerate concurrent appends from different sessions.
/// Implementations share internal state, so clones see the same log.
pub trait LogSink: Clone + Send + Sync + 'static {
    /// Append one line at the end of the log.
    ///
    /// # Invariants
    ///
    /// - Post: the line is the last element returned by [`LogSink::all`]
    fn append(&self, line: &str) -> Result<(), LogError>;

    /// Every stored line, in append order.
    fn all(&self) -> Result<Vec<String>, LogError>;

    /// Drop every stored line.
    ///
    /// Run at server start unless history is kept across restarts.
    fn clear(&self) -> Result<(), LogError>;
}
