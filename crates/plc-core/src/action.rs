//! Pure outputs of a [`crate::context::ProtocolContext`] operation.
//!
//! No variant performs I/O or invokes an application callback itself — the
//! driving loop (in `plc-client`, or a caller's own glue) interprets and
//! executes each action.

use plc_proto::Frame;

/// An action a [`crate::context::ProtocolContext`] asks its driver to
/// perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextAction {
    /// Write this frame to the transport.
    SendFrame(Frame),

    /// A `HANDSHAKE` frame was received; informational.
    HandshakeReceived,

    /// An `AUTH` frame carrying these credential bytes was received. The
    /// driver should validate them and call `accept_auth`/`reject_auth`.
    AuthRequested {
        /// Raw credential bytes from the frame payload.
        credentials: Vec<u8>,
    },

    /// A `COMMAND` frame was received. The driver should compute a
    /// response and call `respond` with the same sequence number.
    CommandReceived {
        /// Sequence number to reply with.
        sequence: u32,
        /// Raw command bytes from the frame payload.
        payload: Vec<u8>,
    },

    /// A `RESPONSE` frame was received and matched (or didn't match) a
    /// pending command.
    ResponseReceived {
        /// Sequence number the response carried.
        sequence: u32,
        /// Raw response bytes from the frame payload.
        payload: Vec<u8>,
        /// Whether a pending command with this sequence existed.
        matched: bool,
    },

    /// The pending command with this sequence resolved successfully.
    ResolveCommand {
        /// Sequence number of the resolved command.
        sequence: u32,
        /// Response payload bytes.
        payload: Vec<u8>,
    },

    /// The pending command with this sequence was rejected.
    RejectCommand {
        /// Sequence number of the rejected command.
        sequence: u32,
        /// Why the command was rejected.
        reason: String,
    },

    /// An `ERROR` frame was received; informational, independent of
    /// whether it matched a pending command.
    ErrorReceived {
        /// Raw error bytes from the frame payload.
        payload: Vec<u8>,
    },

    /// A `HEARTBEAT` frame was received; informational only, no FSM
    /// transition follows.
    HeartbeatReceived,

    /// Close the connection with this reason.
    Close {
        /// Human-readable reason the connection is closing.
        reason: String,
    },
}
