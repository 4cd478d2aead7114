use std::sync::{Arc, Mutex, PoisonError};

use super::{LogError, LogSink};

/// In-memory chat log for tests and throwaway servers.
///
/// Lines live in a `Vec` behind `Arc<Mutex<>>`, so clones share one log.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored lines.
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemoryLog {
    fn append(&self, line: &str) -> Result<(), LogError> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).push(line.to_string());
        Ok(())
    }

    fn all(&self) -> Result<Vec<String>, LogError> {
        Ok(self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn clear(&self) -> Result<(), LogError> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }
}
