//! Frame type combining header and payload.
//!
//! A `Frame` is the unit exchanged on the wire: a 16-byte
//! [`MessageHeader`] followed by its payload bytes. This is a pure data
//! holder; it does not interpret the payload beyond computing/verifying its
//! checksum.

use bytes::{BufMut, Bytes};

use crate::{Flags, MessageType, error::FrameError, header::MessageHeader};

/// A complete protocol frame: header plus payload.
///
/// # Invariants
///
/// `header.payload_length()` always matches `payload.len()` and
/// `header.checksum()` always matches `plc_hash::rotl5_add(&payload)` —
/// both are enforced by [`Frame::build`] and re-verified by [`Frame::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The 16-byte frame header.
    pub header: MessageHeader,
    /// The frame's payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Builds a frame from `(type, flags, sequence, payload)`, computing
    /// `payload_length` and `checksum` automatically.
    ///
    /// # Panics
    ///
    /// Panics if `payload.len() > u32::MAX`, which cannot happen for any
    /// payload actually held in memory on a supported platform.
    #[must_use]
    pub fn build(msg_type: MessageType, flags: Flags, sequence: u32, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        #[allow(clippy::expect_used)]
        let payload_length = u32::try_from(payload.len())
            .expect("invariant: in-memory payload length fits in u32");
        let checksum = plc_hash::rotl5_add(&payload);
        let header = MessageHeader::new(msg_type, flags, sequence, payload_length, checksum);
        Self { header, payload }
    }

    /// Writes `header || payload` to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);
    }

    /// Parses a single frame from the front of `bytes`, with no cap on
    /// `payload_length` beyond what fits in memory. Trailing bytes beyond
    /// the frame are ignored; the caller re-invokes `decode` on the
    /// remainder to parse subsequent frames.
    ///
    /// # Errors
    ///
    /// See [`Frame::decode_with_limit`].
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        Self::decode_with_limit(bytes, usize::MAX)
    }

    /// Like [`Frame::decode`], but rejects a frame whose declared
    /// `payload_length` exceeds `max_payload_len` before buffering or
    /// reading any of the claimed payload bytes — a caller enforcing a
    /// message-size cap should use this instead of buffering up to the
    /// attacker-declared length first.
    ///
    /// # Errors
    ///
    /// - [`FrameError::PayloadTooLarge`] if `payload_length` exceeds
    ///   `max_payload_len`.
    /// - [`FrameError::ShortRead`] if fewer than [`MessageHeader::SIZE`]
    ///   bytes are available, or if the header is valid but fewer than
    ///   `payload_length` bytes follow it — in both cases the caller should
    ///   buffer more bytes and retry, not treat the frame as corrupt.
    /// - [`FrameError::VersionMismatch`] / [`FrameError::UnknownType`] from
    ///   header validation.
    /// - [`FrameError::ChecksumMismatch`] if the recomputed payload checksum
    ///   does not match the header's declared checksum.
    pub fn decode_with_limit(bytes: &[u8], max_payload_len: usize) -> Result<Self, FrameError> {
        let header = MessageHeader::from_bytes(bytes)?;

        let payload_length = header.payload_length() as usize;
        if payload_length > max_payload_len {
            return Err(FrameError::PayloadTooLarge { max: max_payload_len, found: payload_length });
        }
        let total_size = MessageHeader::SIZE + payload_length;

        if bytes.len() < total_size {
            return Err(FrameError::ShortRead { needed: total_size, available: bytes.len() });
        }

        let payload = &bytes[MessageHeader::SIZE..total_size];
        let checksum = plc_hash::rotl5_add(payload);
        if checksum != header.checksum() {
            return Err(FrameError::ChecksumMismatch { expected: header.checksum(), found: checksum });
        }

        Ok(Self { header: *header, payload: Bytes::copy_from_slice(payload) })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for Frame {
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
                prop::collection::vec(any::<u8>(), 0..256),
            )
                .prop_map(|(msg_type, flags, sequence, payload)| {
                    Frame::build(msg_type, Flags::from_bits(flags), sequence, payload)
                })
                .boxed()
        }
    }

    proptest! {
        #[test]
        fn frame_round_trip(frame in any::<Frame>()) {
            let mut wire = Vec::new();
            frame.encode(&mut wire);

            let parsed = Frame::decode(&wire).expect("should decode");
            prop_assert_eq!(frame, parsed);
        }
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let frame = Frame::build(MessageType::Command, Flags::default(), 1, b"hello".to_vec());
        let mut wire = Vec::new();
        frame.encode(&mut wire);
        wire.truncate(wire.len() - 2);

        let err = Frame::decode(&wire).unwrap_err();
        assert!(err.is_short_read());
    }

    #[test]
    fn decode_rejects_tampered_payload() {
        let frame = Frame::build(MessageType::Command, Flags::default(), 1, b"hello".to_vec());
        let mut wire = Vec::new();
        frame.encode(&mut wire);
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        assert!(matches!(Frame::decode(&wire), Err(FrameError::ChecksumMismatch { .. })));
    }

    #[test]
    fn decode_with_limit_rejects_oversized_payload_before_short_read() {
        let frame = Frame::build(MessageType::Command, Flags::default(), 1, vec![0u8; 64]);
        let mut wire = Vec::new();
        frame.encode(&mut wire);
        // Truncate so the buffer doesn't even hold the declared payload —
        // the size check must still fire first, not a ShortRead.
        wire.truncate(MessageHeader::SIZE + 4);

        let err = Frame::decode_with_limit(&wire, 16).unwrap_err();
        assert_eq!(err, FrameError::PayloadTooLarge { max: 16, found: 64 });
    }

    #[test]
    fn decode_with_limit_accepts_payload_at_exactly_the_cap() {
        let frame = Frame::build(MessageType::Command, Flags::default(), 1, vec![0u8; 16]);
        let mut wire = Vec::new();
        frame.encode(&mut wire);

        assert!(Frame::decode_with_limit(&wire, 16).is_ok());
    }

    #[test]
    fn build_sets_payload_length_and_checksum() {
        let frame = Frame::build(MessageType::Heartbeat, Flags::default(), 7, Vec::new());
        assert_eq!(frame.header.payload_length(), 0);
        assert_eq!(frame.header.checksum(), plc_hash::rotl5_add(&[]));
        assert_eq!(frame.header.sequence(), 7);
    }
}
