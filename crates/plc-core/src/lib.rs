//! Protocol context: couples [`plc_proto`]'s frame codec to a
//! [`plc_fsm::StateMachine`] running the fixed connection-lifecycle
//! [`topology`].
//!
//! [`ProtocolContext`] is sans-IO — it owns a receive buffer, a sequence
//! counter, and a pending-response table, but never touches a socket
//! itself. Its operations return [`ContextAction`]s for a driver (an
//! application's own glue, or `plc-client`'s orchestrator) to execute.
//! [`dispatcher::dispatch`] is the pure function deciding, for a decoded
//! frame and the current protocol state, which transition and actions
//! follow.

mod action;
mod config;
mod context;
mod dispatcher;
mod error;
pub mod topology;

pub use action::ContextAction;
pub use config::{
    ContextConfig, DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_RESPONSE_TIMEOUT_MS, DEFAULT_TIMEOUT_MS,
};
pub use context::ProtocolContext;
pub use error::ContextError;
