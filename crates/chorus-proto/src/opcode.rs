//! Frame operation codes.

/// Operation code carried in every frame header.
///
/// Client requests live in `0x10..0x20`, server deliveries in `0x20..`. The
/// handshake is the only frame allowed before a session exists.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Username handshake, first frame of every connection
    Hello = 0x0001,
    /// Request the list of connected users
    UserList = 0x0010,
    /// Chat text to broadcast
    Text = 0x0011,
    /// Graceful disconnect
    Logout = 0x0012,
    /// Request the stored chat history
    History = 0x0013,
    /// One line delivered by the server
    Line = 0x0020,
}

impl Opcode {
    /// Every assigned opcode, in numeric order.
    pub const ALL: [Self; 6] =
        [Self::Hello, Self::UserList, Self::Text, Self::Logout, Self::History, Self::Line];

    /// Raw wire value.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Parse a raw wire value. `None` if unassigned.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Hello),
            0x0010 => Some(Self::UserList),
            0x0011 => Some(Self::Text),
            0x0012 => Some(Self::Logout),
            0x0013 => Some(Self::History),
            0x0020 => Some(Self::Line),
            _ => None,
        }
    }

    /// Whether this opcode carries one of the four dispatchable requests.
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(self, Self::UserList | Self::Text | Self::Logout | Self::History)
    }
}
