//! The fixed 8-byte payload carried by `HANDSHAKE` frames.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::FrameError;

/// Identifies the protocol and its version to the peer.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct HandshakePayload {
    magic: [u8; 4],
    reserved: [u8; 4],
}

impl HandshakePayload {
    /// Serialized size in bytes.
    pub const SIZE: usize = 8;

    /// `"PLC"`, the 24-bit magic constant (carried in a 32-bit field).
    pub const MAGIC: u32 = 0x0050_4C43;

    /// Builds the canonical handshake payload (`magic`, `reserved = 0`).
    #[must_use]
    pub fn new() -> Self {
        Self { magic: Self::MAGIC.to_le_bytes(), reserved: 0u32.to_le_bytes() }
    }

    /// Parses a handshake payload and checks its magic constant.
    ///
    /// # Errors
    ///
    /// [`FrameError::ShortRead`] if fewer than [`Self::SIZE`] bytes are
    /// given, or a magic mismatch, represented as
    /// [`FrameError::UnknownType`] with the low byte of the magic found —
    /// there is no dedicated "bad magic" variant since this is the only
    /// structural check a handshake payload needs beyond size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < Self::SIZE {
            return Err(FrameError::ShortRead { needed: Self::SIZE, available: bytes.len() });
        }
        let payload = Self::read_from_bytes(&bytes[..Self::SIZE])
            .unwrap_or_else(|_| unreachable!("exact-size slice always parses"));
        if payload.magic() != Self::MAGIC {
            return Err(FrameError::UnknownType { found: bytes[0] });
        }
        Ok(payload)
    }

    /// Serializes to the 8-byte wire form.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(&self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// The magic constant as carried on the wire.
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_le_bytes(self.magic)
    }
}

impl Default for HandshakePayload {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::HandshakePayload;
    use crate::error::FrameError;

    #[test]
    fn round_trips() {
        let payload = HandshakePayload::new();
        let bytes = payload.to_bytes();
        let parsed = HandshakePayload::from_bytes(&bytes).expect("should parse");
        assert_eq!(parsed.magic(), HandshakePayload::MAGIC);
    }

    #[test]
    fn magic_matches_spec_constant() {
        assert_eq!(HandshakePayload::MAGIC, 0x0050_4C43);
    }

    #[test]
    fn rejects_short_buffer() {
        let short = [0u8; 4];
        assert!(matches!(
            HandshakePayload::from_bytes(&short),
            Err(FrameError::ShortRead { needed: 8, available: 4 })
        ));
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = HandshakePayload::new().to_bytes();
        bytes[0] = 0xFF;
        assert!(HandshakePayload::from_bytes(&bytes).is_err());
    }
}
