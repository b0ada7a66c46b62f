//! Typed errors for the state machine engine.
//!
//! Covers seven of the ten FSM error codes named by the external interface;
//! `NOT_INITIALIZED` and `INVALID_CONTEXT` live on `plc-core`'s
//! `ContextError` instead, since they describe protocol-context misuse
//! rather than engine misuse — a bare `StateMachine` with no states
//! registered yet is a valid, inert value (`current_state()` just returns
//! `None`), not an error condition.

use thiserror::Error;

/// Errors returned by [`crate::machine::StateMachine`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    /// A state-identifying argument (name or id) was invalid.
    #[error("invalid state: {reason}")]
    InvalidState {
        /// Why the state argument was rejected.
        reason: String,
    },

    /// A transition could not be found, is marked invalid, does not match
    /// the current state, or its guard rejected the attempt.
    #[error("invalid transition: {reason}")]
    InvalidTransition {
        /// Why the transition could not execute.
        reason: String,
    },

    /// `add_state` was called after reaching the machine's state capacity.
    #[error("maximum number of states reached")]
    MaxStatesReached,

    /// `add_transition` was called after reaching the machine's transition
    /// capacity.
    #[error("maximum number of transitions reached")]
    MaxTransitionsReached,

    /// The transition's source or target state is locked.
    #[error("state is locked: {state}")]
    StateLocked {
        /// Name of the locked state.
        state: String,
    },

    /// A state's recomputed checksum (or registered integrity predicate)
    /// did not match its stored checksum.
    #[error("integrity check failed")]
    IntegrityCheckFailed,

    /// A snapshot's captured version no longer matches the live state's
    /// version.
    #[error("version mismatch: snapshot was taken at version {expected}, live state is at {found}")]
    VersionMismatch {
        /// Version recorded in the snapshot.
        expected: u64,
        /// Version of the live state at restore time.
        found: u64,
    },
}
