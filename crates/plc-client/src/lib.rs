//! Client orchestrator built on top of [`plc_core::ProtocolContext`].
//!
//! `plc-core` is sans-IO: it decides what should happen, never how bytes
//! move. This crate supplies the "how" — a [`transport::Transport`]
//! abstraction, a [`connector::Connector`] factory for reconnection, and
//! [`orchestrator::ClientOrchestrator`], the `tokio` task that owns a
//! connection end to end: handshake, auth, command/response correlation,
//! heartbeats, and reconnect with backoff.

mod connector;
mod error;
mod orchestrator;
mod transport;

pub use connector::Connector;
pub use error::{ClientError, TransportError};
pub use orchestrator::{ClientHandle, ClientOrchestrator};
pub use transport::{InMemoryTransport, Transport};
