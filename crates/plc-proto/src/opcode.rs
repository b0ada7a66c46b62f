//! The `type` byte of a [`crate::header::MessageHeader`].

/// The six message kinds this protocol exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Initiates or replies to the connection handshake.
    Handshake = 0x01,
    /// Carries authentication credentials.
    Auth = 0x02,
    /// An opaque application command.
    Command = 0x03,
    /// A reply to a `Command`, echoing its sequence number.
    Response = 0x04,
    /// A reply indicating the triggering message failed.
    Error = 0x05,
    /// A liveness ping with no reply expected.
    Heartbeat = 0x06,
}

impl MessageType {
    /// Raw wire value of this message type.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parses a wire value. `None` if it names no known message type.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Handshake),
            0x02 => Some(Self::Auth),
            0x03 => Some(Self::Command),
            0x04 => Some(Self::Response),
            0x05 => Some(Self::Error),
            0x06 => Some(Self::Heartbeat),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MessageType;

    #[test]
    fn round_trips_every_known_value() {
        for mt in [
            MessageType::Handshake,
            MessageType::Auth,
            MessageType::Command,
            MessageType::Response,
            MessageType::Error,
            MessageType::Heartbeat,
        ] {
            assert_eq!(MessageType::from_u8(mt.to_u8()), Some(mt));
        }
    }

    #[test]
    fn rejects_unknown_value() {
        assert_eq!(MessageType::from_u8(0x00), None);
        assert_eq!(MessageType::from_u8(0x07), None);
        assert_eq!(MessageType::from_u8(0xFF), None);
    }
}
