//! Server error types.

use std::fmt;

use crate::{log::LogError, registry::RegistryError};

/// Errors that stop the server or prevent it from starting.
///
/// Per-session failures never show up here; they end one session and are
/// reported as event lines.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (invalid or unavailable bind address).
    ///
    /// Fatal at startup. Fix configuration and restart.
    Config(String),

    /// Transport error outside any one session (listener I/O).
    Transport(String),

    /// Internal invariant violation (duplicate session id, dead task).
    ///
    /// Should never happen in a correct implementation. Indicates a bug.
    Internal(String),

    /// Chat log could not be opened.
    Log(LogError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Log(err) => write!(f, "chat log error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Log(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LogError> for ServerError {
    fn from(err: LogError) -> Self {
        Self::Log(err)
    }
}

impl From<RegistryError> for ServerError {
    fn from(err: RegistryError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;

    #[test]
    fn duplicate_id_is_internal() {
        let err = ServerError::from(RegistryError::DuplicateId(SessionId::new(3)));

        assert!(matches!(err, ServerError::Internal(_)));
        assert_eq!(err.to_string(), "internal error: session 3 is already registered");
    }

    #[test]
    fn log_error_keeps_source() {
        let err = ServerError::from(LogError::Io("disk full".to_string()));

        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "chat log error: log I/O error: disk full");
    }
}
