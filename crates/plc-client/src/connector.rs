//! The reconnect-capable counterpart to [`crate::transport::Transport`].
//!
//! A [`Transport`] is a single connection; [`Connector`] is the factory the
//! orchestrator calls again each time a new one is needed.

use async_trait::async_trait;

use crate::{error::TransportError, transport::Transport};

/// Establishes a fresh [`Transport`] on demand.
#[async_trait]
pub trait Connector: Send {
    /// The transport this connector produces.
    type Transport: Transport;

    /// Opens a new connection.
    async fn connect(&mut self) -> Result<Self::Transport, TransportError>;
}
