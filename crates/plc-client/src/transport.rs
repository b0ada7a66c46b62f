//! The [`Transport`] abstraction and an in-memory duplex test double.
//!
//! A concrete implementation (TCP, QUIC, ...) lives outside this crate; only
//! the trait and a loopback pair used by this crate's own tests are
//! provided here. Frames, not raw bytes, cross the boundary — encode/decode
//! is the orchestrator's concern (via `plc-core`), not the transport's.

use async_trait::async_trait;
use plc_proto::Frame;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Sends and receives whole frames over a connection.
#[async_trait]
pub trait Transport: Send {
    /// Writes `frame` to the peer.
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Waits for the next frame from the peer, or `Ok(None)` if the peer
    /// closed the connection cleanly.
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError>;
}

/// One end of an in-memory, channel-backed duplex pipe.
///
/// Used by this crate's own tests, and suitable for driving `plc-core`
/// end-to-end without a real socket.
pub struct InMemoryTransport {
    outbound: mpsc::Sender<Frame>,
    inbound: mpsc::Receiver<Frame>,
}

/// Channel capacity for [`duplex`] pairs; generous enough that tests never
/// block on it.
const CHANNEL_CAPACITY: usize = 64;

impl InMemoryTransport {
    /// Builds a connected pair: frames sent on one end arrive on the other.
    #[must_use]
    pub fn duplex() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (b_tx, b_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { outbound: a_tx, inbound: b_rx }, Self { outbound: b_tx, inbound: a_rx })
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.outbound.send(frame).await.map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        Ok(self.inbound.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use plc_proto::{Flags, MessageType};

    use super::*;

    #[tokio::test]
    async fn duplex_delivers_frames_in_both_directions() {
        let (mut left, mut right) = InMemoryTransport::duplex();
        let frame = Frame::build(MessageType::Heartbeat, Flags::default(), 1, Vec::new());

        left.send(frame.clone()).await.unwrap();
        assert_eq!(right.recv().await.unwrap(), Some(frame));

        let reply = Frame::build(MessageType::Heartbeat, Flags::default(), 2, Vec::new());
        right.send(reply.clone()).await.unwrap();
        assert_eq!(left.recv().await.unwrap(), Some(reply));
    }

    #[tokio::test]
    async fn dropping_the_peer_ends_recv_with_none() {
        let (left, mut right) = InMemoryTransport::duplex();
        drop(left);
        assert_eq!(right.recv().await.unwrap(), None);
    }
}
