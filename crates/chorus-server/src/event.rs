//! Operational status output.
//!
//! The server reports two streams of human-readable lines: events (connects,
//! disconnects, failures) and the chat room itself. Where they end up is up
//! to the [`EventSink`]; the default writes them through `tracing`.

use std::sync::{Mutex, PoisonError};

/// Destination for status and chat-room lines.
pub trait EventSink: Send + Sync + 'static {
    /// Operational status line (already timestamped).
    fn append_event(&self, line: &str);

    /// Formatted chat line as broadcast to clients.
    fn append_room(&self, line: &str);
}

/// Console fallback: every line becomes a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn append_event(&self, line: &str) {
        tracing::info!(target: "chorus::event", "{line}");
    }

    fn append_room(&self, line: &str) {
        tracing::info!(target: "chorus::room", "{line}");
    }
}

/// Sink that keeps every line in memory.
///
/// Useful for tests and for front-ends that poll instead of subscribing.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<String>>,
    room: Mutex<Vec<String>>,
}

impl MemoryEventSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Event lines received so far, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Chat-room lines received so far, oldest first.
    pub fn room(&self) -> Vec<String> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl EventSink for MemoryEventSink {
    fn append_event(&self, line: &str) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(line.to_string());
    }

    fn append_room(&self, line: &str) {
        self.room.lock().unwrap_or_else(PoisonError::into_inner).push(line.to_string());
    }
}
