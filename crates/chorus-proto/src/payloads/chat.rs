//! Chat payload types.
//!
//! Bodies of the frames that carry text. Requests without content
//! (`UserList`, `Logout`, `History`) have zero-byte payloads and no struct.

use serde::{Deserialize, Serialize};

/// Username handshake, the first frame a client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Display name for the whole session
    pub username: String,
}

/// Raw user-entered chat text (not yet timestamped or attributed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// Message body
    pub text: String,
}

/// One line delivered by the server: a chat line, a listing row or a
/// history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Fully formatted line
    pub text: String,
}
