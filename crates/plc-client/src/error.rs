//! Errors for the client orchestrator and its [`crate::transport::Transport`]
//! abstraction.

use thiserror::Error;

/// Errors a [`crate::transport::Transport`] implementation may report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer closed the connection, or the local half was dropped.
    #[error("transport closed")]
    Closed,

    /// Sending or receiving failed at the transport layer.
    #[error("transport io error: {0}")]
    Io(String),
}

/// Errors returned by [`crate::orchestrator::ClientOrchestrator`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport reported an error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Propagated from the protocol context.
    #[error(transparent)]
    Context(#[from] plc_core::ContextError),

    /// The orchestrator was shut down before this command could complete.
    #[error("client is shutting down")]
    ShuttingDown,

    /// Reconnection was attempted `max_retries` times and gave up.
    #[error("reconnect attempts exhausted")]
    ReconnectExhausted,
}

impl ClientError {
    /// True if retrying the same operation later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Context(err) => err.is_transient(),
            Self::ShuttingDown | Self::ReconnectExhausted => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_transient() {
        assert!(ClientError::Transport(TransportError::Closed).is_transient());
    }

    #[test]
    fn shutdown_and_exhaustion_are_not_transient() {
        assert!(!ClientError::ShuttingDown.is_transient());
        assert!(!ClientError::ReconnectExhausted.is_transient());
    }
}
