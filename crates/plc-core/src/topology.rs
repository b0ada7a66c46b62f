//! The fixed connection-lifecycle topology wired on top of the generic
//! [`plc_fsm::StateMachine`].
//!
//! The engine itself has no wildcard-transition concept, so "any non-final
//! state → error" and "any state → closed" are realized as one explicitly
//! named transition per applicable source state.

use plc_fsm::{FsmError, StateMachine};

/// `init` state id.
pub const INIT: usize = 0;
/// `handshake` state id.
pub const HANDSHAKE: usize = 1;
/// `auth` state id.
pub const AUTH: usize = 2;
/// `ready` state id.
pub const READY: usize = 3;
/// `error` state id.
pub const ERROR: usize = 4;
/// `closed` state id (final).
pub const CLOSED: usize = 5;

const STATE_COUNT: usize = 6;
const TRANSITION_COUNT: usize = 12;

/// Name of the transition driving a given source state to `error`, if that
/// state has one (every non-final state does; `closed` does not).
#[must_use]
pub fn to_error_transition(state: usize) -> Option<&'static str> {
    match state {
        INIT => Some("init_to_error"),
        HANDSHAKE => Some("handshake_to_error"),
        AUTH => Some("auth_to_error"),
        READY => Some("ready_to_error"),
        _ => None,
    }
}

/// Name of the transition driving a given source state to `closed`, if
/// that state has one (every state does except `closed` itself).
#[must_use]
pub fn to_closed_transition(state: usize) -> Option<&'static str> {
    match state {
        INIT => Some("init_to_closed"),
        HANDSHAKE => Some("handshake_to_closed"),
        AUTH => Some("auth_to_closed"),
        READY => Some("ready_to_closed"),
        ERROR => Some("error_to_closed"),
        _ => None,
    }
}

/// Builds the connection-lifecycle FSM: `init → handshake → auth → ready`,
/// with an `error` branch reachable from any non-final state and `closed`
/// (final) reachable from every state.
///
/// # Errors
///
/// Only if the fixed topology below is malformed, which would be a bug in
/// this function, not in caller input.
pub fn build() -> Result<StateMachine<()>, FsmError> {
    let mut machine = StateMachine::new(STATE_COUNT, TRANSITION_COUNT);

    machine.add_state("init", None, None, false)?;
    machine.add_state("handshake", None, None, false)?;
    machine.add_state("auth", None, None, false)?;
    machine.add_state("ready", None, None, false)?;
    machine.add_state("error", None, None, false)?;
    machine.add_state("closed", None, None, true)?;

    machine.add_transition("to_handshake", INIT, HANDSHAKE, None, None)?;
    machine.add_transition("to_auth", HANDSHAKE, AUTH, None, None)?;
    machine.add_transition("to_ready", AUTH, READY, None, None)?;

    machine.add_transition("init_to_error", INIT, ERROR, None, None)?;
    machine.add_transition("handshake_to_error", HANDSHAKE, ERROR, None, None)?;
    machine.add_transition("auth_to_error", AUTH, ERROR, None, None)?;
    machine.add_transition("ready_to_error", READY, ERROR, None, None)?;

    machine.add_transition("init_to_closed", INIT, CLOSED, None, None)?;
    machine.add_transition("handshake_to_closed", HANDSHAKE, CLOSED, None, None)?;
    machine.add_transition("auth_to_closed", AUTH, CLOSED, None, None)?;
    machine.add_transition("ready_to_closed", READY, CLOSED, None, None)?;
    machine.add_transition("error_to_closed", ERROR, CLOSED, None, None)?;

    Ok(machine)
}

/// Human-readable name for a topology state id, for error messages.
#[must_use]
pub fn state_name(id: usize) -> &'static str {
    match id {
        INIT => "init",
        HANDSHAKE => "handshake",
        AUTH => "auth",
        READY => "ready",
        ERROR => "error",
        CLOSED => "closed",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_six_states_and_twelve_transitions() {
        let machine = build().unwrap();
        assert_eq!(machine.state_count(), STATE_COUNT);
        assert_eq!(machine.current_state().unwrap().name(), "init");
    }

    #[test]
    fn every_non_final_state_can_reach_error() {
        for state in [INIT, HANDSHAKE, AUTH, READY] {
            let mut machine = build().unwrap();
            // Walk to `state` first via the happy path, then exercise the
            // to_error edge from there.
            match state {
                INIT => {},
                HANDSHAKE => {
                    machine.execute_transition("to_handshake", &mut ()).unwrap();
                },
                AUTH => {
                    machine.execute_transition("to_handshake", &mut ()).unwrap();
                    machine.execute_transition("to_auth", &mut ()).unwrap();
                },
                READY => {
                    machine.execute_transition("to_handshake", &mut ()).unwrap();
                    machine.execute_transition("to_auth", &mut ()).unwrap();
                    machine.execute_transition("to_ready", &mut ()).unwrap();
                },
                _ => unreachable!(),
            }
            machine.execute_transition(to_error_transition(state).unwrap(), &mut ()).unwrap();
            assert_eq!(machine.current_state().unwrap().name(), "error");
        }
    }

    #[test]
    fn every_state_can_reach_closed() {
        let mut machine = build().unwrap();
        machine.execute_transition(to_closed_transition(INIT).unwrap(), &mut ()).unwrap();
        assert_eq!(machine.current_state().unwrap().name(), "closed");
    }
}
