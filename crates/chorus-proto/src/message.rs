//! Client requests.

use crate::{
    Frame, Payload,
    errors::{ProtocolError, Result},
    payloads::chat,
};

/// One request sent by a connected client.
///
/// Exactly four kinds exist; the server matches on them exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// List the connected users
    UserList,
    /// Raw chat text to broadcast
    Text(String),
    /// Leave the chat
    Logout,
    /// Replay the stored chat log
    History,
}

impl Message {
    /// Legacy integer tag (`USERLIST=0, MESSAGE=1, LOGOUT=2, HISTORY=3`).
    ///
    /// Used for diagnostics only; the wire uses [`crate::Opcode`].
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::UserList => 0,
            Self::Text(_) => 1,
            Self::Logout => 2,
            Self::History => 3,
        }
    }

    /// Encode as a frame.
    pub fn into_frame(self) -> Result<Frame> {
        Payload::from(self).into_frame()
    }

    /// Decode from a frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnexpectedOpcode` for `Hello` or `Line` frames
    /// - any payload decoding error
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        Self::try_from(Payload::from_frame(frame)?)
    }
}

impl From<Message> for Payload {
    fn from(message: Message) -> Self {
        match message {
            Message::UserList => Self::UserList,
            Message::Text(text) => Self::Text(chat::Text { text }),
            Message::Logout => Self::Logout,
            Message::History => Self::History,
        }
    }
}

impl TryFrom<Payload> for Message {
    type Error = ProtocolError;

    fn try_from(payload: Payload) -> Result<Self> {
        match payload {
            Payload::UserList => Ok(Self::UserList),
            Payload::Text(chat::Text { text }) => Ok(Self::Text(text)),
            Payload::Logout => Ok(Self::Logout),
            Payload::History => Ok(Self::History),
            other @ (Payload::Hello(_) | Payload::Line(_)) => {
                Err(ProtocolError::UnexpectedOpcode(other.opcode()))
            },
        }
    }
}
