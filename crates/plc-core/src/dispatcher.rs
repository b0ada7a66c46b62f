//! Pure classification of a decoded frame against the current protocol
//! state.
//!
//! [`dispatch`] performs no I/O and mutates nothing; it is a function of
//! its inputs only (including the next sequence number, passed in rather
//! than read from shared state, so the function stays referentially
//! transparent). The caller ([`crate::context::ProtocolContext`]) applies
//! the returned transition, bumps its sequence counter if a sequence was
//! consumed, and executes the returned actions.

use plc_proto::{Flags, Frame, MessageType, payloads::HandshakePayload};

use crate::{action::ContextAction, error::ContextError, topology};

/// What a single `dispatch` call determined should happen.
pub(crate) struct DispatchOutcome {
    /// Name of the topology transition to execute, if the frame drives one.
    pub transition: Option<&'static str>,
    /// Actions for the driver to execute, in order.
    pub actions: Vec<ContextAction>,
    /// Whether `next_sequence` was used to build an outbound frame.
    pub consumed_sequence: bool,
}

impl DispatchOutcome {
    fn simple(actions: Vec<ContextAction>) -> Self {
        Self { transition: None, actions, consumed_sequence: false }
    }
}

/// Classifies `frame`, received while the protocol is in `state`
/// (a [`topology`] state id), and decides what should happen next.
///
/// `has_pending` reports whether a pending command with the frame's
/// sequence number exists; `next_sequence` is the value the caller would
/// assign to an outbound frame this call builds (a `HANDSHAKE` reply).
///
/// # Errors
///
/// [`ContextError::Protocol`] if the frame's type is illegal for `state`.
pub(crate) fn dispatch(
    state: usize,
    frame: &Frame,
    has_pending: bool,
    next_sequence: u32,
) -> Result<DispatchOutcome, ContextError> {
    let Some(msg_type) = frame.header.msg_type() else {
        return Err(ContextError::Protocol {
            state: topology::state_name(state).to_string(),
            reason: "frame carries an unrecognized message type".to_string(),
        });
    };

    match msg_type {
        MessageType::Handshake => dispatch_handshake(state, next_sequence),
        MessageType::Auth => dispatch_auth(state, frame),
        MessageType::Command => dispatch_command(state, frame),
        MessageType::Response => dispatch_response(state, frame, has_pending),
        MessageType::Error => Ok(dispatch_error(frame, has_pending)),
        MessageType::Heartbeat => Ok(DispatchOutcome::simple(vec![ContextAction::HeartbeatReceived])),
    }
}

fn dispatch_handshake(state: usize, next_sequence: u32) -> Result<DispatchOutcome, ContextError> {
    if state == topology::INIT {
        let reply = Frame::build(MessageType::Handshake, Flags::default(), next_sequence, HandshakePayload::new().to_bytes().to_vec());
        return Ok(DispatchOutcome {
            transition: Some("to_handshake"),
            actions: vec![ContextAction::HandshakeReceived, ContextAction::SendFrame(reply)],
            consumed_sequence: true,
        });
    }
    if state == topology::HANDSHAKE {
        return Ok(DispatchOutcome {
            transition: Some("to_auth"),
            actions: vec![ContextAction::HandshakeReceived],
            consumed_sequence: false,
        });
    }
    Err(ContextError::Protocol {
        state: topology::state_name(state).to_string(),
        reason: "unexpected HANDSHAKE frame".to_string(),
    })
}

fn dispatch_auth(state: usize, frame: &Frame) -> Result<DispatchOutcome, ContextError> {
    let actions = vec![ContextAction::AuthRequested { credentials: frame.payload.to_vec() }];
    match state {
        // The responder may still be sitting in `handshake` when the
        // initiator's AUTH frame arrives — it only ever sees one HANDSHAKE
        // frame (DESIGN.md's Open Question #2), so AUTH itself is what
        // drives its `handshake -> auth` transition.
        topology::HANDSHAKE => Ok(DispatchOutcome { transition: Some("to_auth"), actions, consumed_sequence: false }),
        topology::AUTH => Ok(DispatchOutcome::simple(actions)),
        _ => Err(ContextError::Protocol {
            state: topology::state_name(state).to_string(),
            reason: "AUTH frame received outside HANDSHAKE/AUTH".to_string(),
        }),
    }
}

fn dispatch_command(state: usize, frame: &Frame) -> Result<DispatchOutcome, ContextError> {
    if state != topology::READY {
        return Err(ContextError::Protocol {
            state: topology::state_name(state).to_string(),
            reason: "COMMAND frame received outside the ready state".to_string(),
        });
    }
    Ok(DispatchOutcome::simple(vec![ContextAction::CommandReceived {
        sequence: frame.header.sequence(),
        payload: frame.payload.to_vec(),
    }]))
}

fn dispatch_response(state: usize, frame: &Frame, has_pending: bool) -> Result<DispatchOutcome, ContextError> {
    if state != topology::READY {
        return Err(ContextError::Protocol {
            state: topology::state_name(state).to_string(),
            reason: "RESPONSE frame received outside the ready state".to_string(),
        });
    }
    let sequence = frame.header.sequence();
    let payload = frame.payload.to_vec();
    let mut actions = vec![ContextAction::ResponseReceived { sequence, payload: payload.clone(), matched: has_pending }];
    if has_pending {
        actions.push(ContextAction::ResolveCommand { sequence, payload });
    }
    Ok(DispatchOutcome::simple(actions))
}

fn dispatch_error(frame: &Frame, has_pending: bool) -> DispatchOutcome {
    let sequence = frame.header.sequence();
    let payload = frame.payload.to_vec();
    let mut actions = Vec::new();
    if has_pending {
        actions.push(ContextAction::RejectCommand {
            sequence,
            reason: String::from_utf8_lossy(&payload).into_owned(),
        });
    }
    actions.push(ContextAction::ErrorReceived { payload });
    DispatchOutcome::simple(actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_in_init_begins_handshake_and_replies() {
        let frame = Frame::build(MessageType::Handshake, Flags::default(), 1, HandshakePayload::new().to_bytes().to_vec());
        let outcome = dispatch(topology::INIT, &frame, false, 1).unwrap();
        assert_eq!(outcome.transition, Some("to_handshake"));
        assert!(outcome.consumed_sequence);
        assert_eq!(outcome.actions.len(), 2);
    }

    #[test]
    fn handshake_in_handshake_completes_to_auth() {
        let frame = Frame::build(MessageType::Handshake, Flags::default(), 1, HandshakePayload::new().to_bytes().to_vec());
        let outcome = dispatch(topology::HANDSHAKE, &frame, false, 2).unwrap();
        assert_eq!(outcome.transition, Some("to_auth"));
        assert!(!outcome.consumed_sequence);
    }

    #[test]
    fn auth_in_handshake_completes_to_auth() {
        let frame = Frame::build(MessageType::Auth, Flags::default(), 1, b"creds".to_vec());
        let outcome = dispatch(topology::HANDSHAKE, &frame, false, 1).unwrap();
        assert_eq!(outcome.transition, Some("to_auth"));
        assert_eq!(
            outcome.actions,
            vec![ContextAction::AuthRequested { credentials: b"creds".to_vec() }]
        );
    }

    #[test]
    fn auth_outside_handshake_or_auth_state_is_a_violation() {
        let frame = Frame::build(MessageType::Auth, Flags::default(), 1, b"creds".to_vec());
        let err = dispatch(topology::INIT, &frame, false, 1).unwrap_err();
        assert!(matches!(err, ContextError::Protocol { .. }));
    }

    #[test]
    fn command_in_ready_emits_command_received() {
        let frame = Frame::build(MessageType::Command, Flags::default(), 42, b"status".to_vec());
        let outcome = dispatch(topology::READY, &frame, false, 1).unwrap();
        assert_eq!(
            outcome.actions,
            vec![ContextAction::CommandReceived { sequence: 42, payload: b"status".to_vec() }]
        );
    }

    #[test]
    fn response_with_pending_resolves() {
        let frame = Frame::build(MessageType::Response, Flags::default(), 42, b"ok".to_vec());
        let outcome = dispatch(topology::READY, &frame, true, 1).unwrap();
        assert_eq!(
            outcome.actions,
            vec![
                ContextAction::ResponseReceived { sequence: 42, payload: b"ok".to_vec(), matched: true },
                ContextAction::ResolveCommand { sequence: 42, payload: b"ok".to_vec() },
            ]
        );
    }

    #[test]
    fn response_without_pending_is_discarded_but_reported() {
        let frame = Frame::build(MessageType::Response, Flags::default(), 7, b"late".to_vec());
        let outcome = dispatch(topology::READY, &frame, false, 1).unwrap();
        assert_eq!(
            outcome.actions,
            vec![ContextAction::ResponseReceived { sequence: 7, payload: b"late".to_vec(), matched: false }]
        );
    }

    #[test]
    fn heartbeat_never_violates_and_never_transitions() {
        let frame = Frame::build(MessageType::Heartbeat, Flags::default(), 1, Vec::new());
        for state in [topology::INIT, topology::HANDSHAKE, topology::AUTH, topology::READY] {
            let outcome = dispatch(state, &frame, false, 1).unwrap();
            assert!(outcome.transition.is_none());
        }
    }
}
