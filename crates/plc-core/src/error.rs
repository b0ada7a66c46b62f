//! Errors for the protocol context layer.
//!
//! Covers the two FSM error codes that describe context-level misuse
//! (`INVALID_CONTEXT`, `NOT_INITIALIZED`) plus framing and protocol
//! violations surfaced while driving a connection; the rest of the FSM
//! error space is [`plc_fsm::FsmError`], reachable through the `Fsm`
//! variant.

use thiserror::Error;

/// Errors returned by [`crate::context::ProtocolContext`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// An operation requiring a live handshake was attempted before one
    /// began, or after the context was closed.
    #[error("protocol context not initialized: {reason}")]
    NotInitialized {
        /// Why the context isn't ready for the attempted operation.
        reason: String,
    },

    /// A caller-supplied argument doesn't name anything this context
    /// recognizes (e.g. resolving a sequence with no pending entry).
    #[error("invalid context argument: {reason}")]
    InvalidContext {
        /// Why the argument was rejected.
        reason: String,
    },

    /// A received frame was legal on the wire but illegal for the current
    /// protocol state (e.g. an `AUTH` frame outside `auth`).
    #[error("protocol violation in state {state}: {reason}")]
    Protocol {
        /// Name of the protocol state the violation occurred in.
        state: String,
        /// Description of the violation.
        reason: String,
    },

    /// A pending command's deadline elapsed before a response arrived.
    #[error("command timed out")]
    Timeout,

    /// The connection was closed while requests were still pending.
    #[error("connection closed")]
    ConnectionClosed,

    /// Propagated from the underlying state machine engine.
    #[error(transparent)]
    Fsm(#[from] plc_fsm::FsmError),

    /// Propagated from frame decoding.
    #[error(transparent)]
    Frame(#[from] plc_proto::FrameError),
}

impl ContextError {
    /// True if retrying the same operation later might succeed — timeouts
    /// and a closed connection are transient; framing, protocol, and FSM
    /// precondition violations indicate a broken peer or caller and are
    /// not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_closed_are_transient() {
        assert!(ContextError::Timeout.is_transient());
        assert!(ContextError::ConnectionClosed.is_transient());
    }

    #[test]
    fn protocol_and_fsm_errors_are_not_transient() {
        assert!(
            !ContextError::Protocol { state: "ready".to_string(), reason: "bad type".to_string() }
                .is_transient()
        );
        assert!(!ContextError::Fsm(plc_fsm::FsmError::IntegrityCheckFailed).is_transient());
        assert!(
            !ContextError::Frame(plc_proto::FrameError::VersionMismatch { found: 2 }).is_transient()
        );
    }
}
