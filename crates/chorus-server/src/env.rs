//! Wall-clock environment.
//!
//! Every timestamp the server writes (chat lines, event lines, connect times)
//! comes from an [`Environment`], so tests can pin the clock and compare
//! formatted lines exactly.

use chrono::{DateTime, Local};

/// Source of wall-clock time.
///
/// # Invariants
///
/// - `now()` is the only way server logic reads the clock
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current local time.
    fn now(&self) -> DateTime<Local>;
}

/// Production environment using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
