//! Errors produced while decoding frames.

use thiserror::Error;

/// Errors from [`crate::header::MessageHeader::from_bytes`] and
/// [`crate::frame::Frame::decode`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes are available than the operation needs. Not necessarily
    /// fatal — a stream-oriented caller should buffer more and retry.
    #[error("short read: need {needed} bytes, have {available}")]
    ShortRead {
        /// Bytes required to make progress.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// `version` byte did not match the one supported version.
    #[error("unsupported protocol version: {found}")]
    VersionMismatch {
        /// The version byte found on the wire.
        found: u8,
    },

    /// `type` byte did not match a known [`crate::opcode::MessageType`].
    #[error("unknown message type: {found:#04x}")]
    UnknownType {
        /// The type byte found on the wire.
        found: u8,
    },

    /// Recomputed checksum did not match the header's declared checksum.
    #[error("checksum mismatch: expected {expected:#010x}, computed {found:#010x}")]
    ChecksumMismatch {
        /// Checksum carried in the header.
        expected: u32,
        /// Checksum recomputed over the received payload.
        found: u32,
    },

    /// Declared `payload_length` exceeds the caller's configured cap.
    /// Checked before buffering the claimed payload, so an oversized
    /// declaration is rejected without waiting for more bytes to arrive.
    #[error("payload length {found} exceeds the {max}-byte cap")]
    PayloadTooLarge {
        /// The configured cap.
        max: usize,
        /// The declared `payload_length`.
        found: usize,
    },
}

impl FrameError {
    /// True if this error means "not enough bytes yet" rather than "this
    /// data is corrupt" — the caller should keep buffering, not drop the
    /// connection.
    #[must_use]
    pub fn is_short_read(&self) -> bool {
        matches!(self, Self::ShortRead { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_read_is_not_fatal() {
        assert!(FrameError::ShortRead { needed: 16, available: 4 }.is_short_read());
        assert!(!FrameError::VersionMismatch { found: 2 }.is_short_read());
        assert!(!FrameError::ChecksumMismatch { expected: 1, found: 2 }.is_short_read());
    }
}
