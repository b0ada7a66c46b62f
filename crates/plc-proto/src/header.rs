//! Frame header implementation with zero-copy parsing.
//!
//! The `MessageHeader` is a fixed 16-byte structure serialized as raw binary
//! (little-endian). All multi-byte integers are stored as raw byte arrays
//! to avoid alignment issues under `#[repr(C, packed)]`.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Flags, MessageType, error::FrameError};

/// Fixed 16-byte frame header (little-endian on the wire).
///
/// | Offset | Size | Field |
/// |---|---|---|
/// | 0 | 1 | version |
/// | 1 | 1 | type |
/// | 2 | 2 | flags |
/// | 4 | 4 | sequence |
/// | 8 | 4 | payload_length |
/// | 12 | 4 | checksum (of payload only) |
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct MessageHeader {
    version: u8,
    msg_type: u8,
    flags: [u8; 2],
    sequence: [u8; 4],
    payload_length: [u8; 4],
    checksum: [u8; 4],
}

impl MessageHeader {
    /// Size of the serialized header in bytes.
    pub const SIZE: usize = 16;

    /// The only protocol version this runtime speaks.
    pub const VERSION: u8 = 1;

    /// Builds a header from already-known field values. The caller (the
    /// protocol context, in practice) is responsible for sequence
    /// assignment and checksum computation — this constructor does not
    /// derive either from a payload.
    #[must_use]
    pub fn new(msg_type: MessageType, flags: Flags, sequence: u32, payload_length: u32, checksum: u32) -> Self {
        Self {
            version: Self::VERSION,
            msg_type: msg_type.to_u8(),
            flags: flags.bits().to_le_bytes(),
            sequence: sequence.to_le_bytes(),
            payload_length: payload_length.to_le_bytes(),
            checksum: checksum.to_le_bytes(),
        }
    }

    /// Parses a header from the front of `bytes` (zero-copy, safe).
    ///
    /// # Errors
    ///
    /// - [`FrameError::ShortRead`] if fewer than [`Self::SIZE`] bytes are
    ///   available.
    /// - [`FrameError::VersionMismatch`] if `version != 1`.
    /// - [`FrameError::UnknownType`] if `type` names no known
    ///   [`MessageType`].
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self, FrameError> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| FrameError::ShortRead { needed: Self::SIZE, available: bytes.len() })?
            .0;

        if header.version != Self::VERSION {
            return Err(FrameError::VersionMismatch { found: header.version });
        }

        if MessageType::from_u8(header.msg_type).is_none() {
            return Err(FrameError::UnknownType { found: header.msg_type });
        }

        Ok(header)
    }

    /// Serializes the header to its 16-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Protocol version byte (currently always 1).
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Message type. `None` only if the header was constructed bypassing
    /// [`Self::from_bytes`]'s validation.
    #[must_use]
    pub fn msg_type(&self) -> Option<MessageType> {
        MessageType::from_u8(self.msg_type)
    }

    /// Raw message type byte, valid or not.
    #[must_use]
    pub fn msg_type_raw(&self) -> u8 {
        self.msg_type
    }

    /// Advisory flags bitfield.
    #[must_use]
    pub fn flags(&self) -> Flags {
        Flags::from_bits(u16::from_le_bytes(self.flags))
    }

    /// Sender-assigned sequence number.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        u32::from_le_bytes(self.sequence)
    }

    /// Declared payload length in bytes.
    #[must_use]
    pub fn payload_length(&self) -> u32 {
        u32::from_le_bytes(self.payload_length)
    }

    /// Checksum over the payload only (see [`plc_hash::rotl5_add`]).
    #[must_use]
    pub fn checksum(&self) -> u32 {
        u32::from_le_bytes(self.checksum)
    }
}

// Manual Debug impl: can't derive on a `#[repr(C, packed)]` struct because
// field references would be unaligned.
impl std::fmt::Debug for MessageHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHeader")
            .field("version", &self.version())
            .field("msg_type", &self.msg_type_raw())
            .field("flags", &self.flags())
            .field("sequence", &self.sequence())
            .field("payload_length", &self.payload_length())
            .field("checksum", &format!("{:#010x}", self.checksum()))
            .finish()
    }
}

// Manual PartialEq impl for the same reason.
impl PartialEq for MessageHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for MessageHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for MessageHeader {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (
                prop_oneof![
                    Just(MessageType::Handshake),
                    Just(MessageType::Auth),
                    Just(MessageType::Command),
                    Just(MessageType::Response),
                    Just(MessageType::Error),
                    Just(MessageType::Heartbeat),
                ],
                any::<u16>(),
                any::<u32>(),
                any::<u32>(),
                any::<u32>(),
            )
                .prop_map(|(msg_type, flags, sequence, payload_length, checksum)| {
                    MessageHeader::new(msg_type, Flags::from_bits(flags), sequence, payload_length, checksum)
                })
                .boxed()
        }
    }

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<MessageHeader>(), MessageHeader::SIZE);
        assert_eq!(MessageHeader::SIZE, 16);
    }

    proptest! {
        #[test]
        fn header_round_trip(header in any::<MessageHeader>()) {
            let bytes = header.to_bytes();
            let parsed = MessageHeader::from_bytes(&bytes).expect("should parse");
            prop_assert_eq!(&header, parsed);
        }
    }

    #[test]
    fn reject_short_buffer() {
        let short = [0u8; 10];
        assert_eq!(
            MessageHeader::from_bytes(&short),
            Err(FrameError::ShortRead { needed: 16, available: 10 })
        );
    }

    #[test]
    fn reject_bad_version() {
        let header = MessageHeader::new(MessageType::Heartbeat, Flags::default(), 1, 0, 0);
        let mut bytes = header.to_bytes();
        bytes[0] = 2;
        assert_eq!(MessageHeader::from_bytes(&bytes), Err(FrameError::VersionMismatch { found: 2 }));
    }

    #[test]
    fn reject_unknown_type() {
        let header = MessageHeader::new(MessageType::Heartbeat, Flags::default(), 1, 0, 0);
        let mut bytes = header.to_bytes();
        bytes[1] = 0x7F;
        assert_eq!(MessageHeader::from_bytes(&bytes), Err(FrameError::UnknownType { found: 0x7F }));
    }

    #[test]
    fn fields_round_trip_little_endian() {
        let header = MessageHeader::new(MessageType::Command, Flags::default().with_urgent(true), 42, 6, 0xDEAD_BEEF);
        let bytes = header.to_bytes();
        assert_eq!(bytes[4..8], 42u32.to_le_bytes());
        assert_eq!(bytes[8..12], 6u32.to_le_bytes());
        assert_eq!(bytes[12..16], 0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(header.sequence(), 42);
        assert_eq!(header.payload_length(), 6);
        assert!(header.flags().is_urgent());
    }
}
