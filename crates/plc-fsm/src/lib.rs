//! A generic, name-driven, checksum-verified finite state machine engine.
//!
//! [`StateMachine`] owns a fixed-capacity collection of [`State`]s and
//! [`Transition`]s and tracks exactly one current state. Every mutating
//! operation restamps the touched state (bumps its version, refreshes its
//! timestamp, recomputes its checksum), so [`StateMachine::verify_state_integrity`]
//! can detect out-of-band tampering with a state's data.
//!
//! `execute_transition` enforces preconditions in a fixed order: the
//! transition must be marked valid, the machine's current state must match
//! the transition's source, neither endpoint may be locked, and the
//! transition's guard (if any) must accept. Hooks run in `on_exit` →
//! `action` → `on_enter` order inside a panic guard: a panicking hook is
//! caught and treated as a failed transition, leaving the machine in its
//! original state.

mod diagnostics;
mod error;
mod hooks;
mod machine;
mod snapshot;
mod state;
mod transition;

pub use diagnostics::Diagnostics;
pub use error::FsmError;
pub use hooks::{ActionFn, EnterExitFn, GuardFn};
pub use machine::StateMachine;
pub use snapshot::StateSnapshot;
pub use state::State;
pub use transition::Transition;
