//! Per-connection protocol context: couples a transport-agnostic frame
//! buffer to a [`plc_fsm::StateMachine`] running the [`crate::topology`].

use std::{
    collections::HashMap,
    ops::Sub,
    time::Duration,
};

use bytes::{BufMut, BytesMut};
use plc_fsm::StateMachine;
use plc_proto::{Flags, Frame, MessageType, payloads::HandshakePayload};

use crate::{action::ContextAction, config::ContextConfig, dispatcher, error::ContextError, topology};

struct PendingEntry<I> {
    deadline: I,
}

/// A single connection's FSM, sequence counter, pending-response table, and
/// receive buffer.
///
/// Generic over an instant type `I` so tests can drive it with a
/// hand-advanced fake clock instead of `std::time::Instant`.
pub struct ProtocolContext<I> {
    fsm: StateMachine<()>,
    config: ContextConfig,
    next_sequence: u32,
    pending: HashMap<u32, PendingEntry<I>>,
    recv_buffer: BytesMut,
    last_heartbeat_sent: Option<I>,
    last_heartbeat_received: Option<I>,
}

impl<I> ProtocolContext<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Creates a context in the `init` state.
    ///
    /// # Errors
    ///
    /// Only if [`topology::build`] itself fails, which indicates a bug in
    /// this crate's fixed topology, not caller input.
    pub fn new(config: ContextConfig) -> Result<Self, ContextError> {
        Ok(Self {
            fsm: topology::build()?,
            config,
            next_sequence: 1,
            pending: HashMap::new(),
            recv_buffer: BytesMut::new(),
            last_heartbeat_sent: None,
            last_heartbeat_received: None,
        })
    }

    /// The current topology state id (see [`topology`]).
    #[must_use]
    pub fn protocol_state(&self) -> usize {
        self.fsm.current_state().map_or(topology::INIT, |state| state.id())
    }

    /// Human-readable name of the current protocol state.
    #[must_use]
    pub fn protocol_state_name(&self) -> &'static str {
        topology::state_name(self.protocol_state())
    }

    /// Number of commands still awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// When the last `HEARTBEAT` frame was received from the peer,
    /// resetting the peer-liveness deadline. `None` before the first one.
    #[must_use]
    pub fn last_heartbeat_received(&self) -> Option<I> {
        self.last_heartbeat_received
    }

    fn take_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }

    /// Begins the handshake: builds and returns a `HANDSHAKE` frame to
    /// send, transitioning `init → handshake`.
    ///
    /// # Errors
    ///
    /// [`ContextError::Fsm`] if the context isn't in `init`.
    pub fn begin_handshake(&mut self, _now: I) -> Result<ContextAction, ContextError> {
        let sequence = self.take_sequence();
        let frame = Frame::build(MessageType::Handshake, Flags::default(), sequence, HandshakePayload::new().to_bytes().to_vec());
        self.fsm.execute_transition("to_handshake", &mut ())?;
        Ok(ContextAction::SendFrame(frame))
    }

    /// Assigns a sequence, builds a `COMMAND` frame, and registers a
    /// pending-response entry with a deadline `response_timeout_ms` from
    /// `now`.
    ///
    /// # Errors
    ///
    /// [`ContextError::InvalidContext`] if the context is `closed`;
    /// [`ContextError::NotInitialized`] if the handshake hasn't reached
    /// `ready` yet.
    pub fn send_command(&mut self, payload: Vec<u8>, now: I) -> Result<(u32, ContextAction), ContextError>
    where
        I: std::ops::Add<Duration, Output = I>,
    {
        if self.protocol_state() == topology::CLOSED {
            return Err(ContextError::InvalidContext { reason: "context is closed".to_string() });
        }
        if self.protocol_state() != topology::READY {
            return Err(ContextError::NotInitialized {
                reason: format!("handshake not complete, context is in {}", self.protocol_state_name()),
            });
        }
        let sequence = self.take_sequence();
        let frame = Frame::build(MessageType::Command, Flags::default(), sequence, payload);
        let deadline = now + Duration::from_millis(u64::from(self.config.response_timeout_ms));
        self.pending.insert(sequence, PendingEntry { deadline });
        Ok((sequence, ContextAction::SendFrame(frame)))
    }

    /// Builds a `RESPONSE` frame echoing `sequence`, for replying to a
    /// [`ContextAction::CommandReceived`].
    #[must_use]
    pub fn respond(&self, sequence: u32, payload: Vec<u8>) -> ContextAction {
        ContextAction::SendFrame(Frame::build(MessageType::Response, Flags::default(), sequence, payload))
    }

    /// Builds an `ERROR` frame echoing `sequence`, for replying to a
    /// [`ContextAction::CommandReceived`] the application chose to reject.
    #[must_use]
    pub fn respond_error(&self, sequence: u32, payload: Vec<u8>) -> ContextAction {
        ContextAction::SendFrame(Frame::build(MessageType::Error, Flags::default(), sequence, payload))
    }

    /// Builds an `AUTH` frame carrying `credentials` while in the `auth`
    /// state. Mirrors the peer's own `AUTH` exchange — both sides run the
    /// same dispatcher, so the peer receiving this frame sees an
    /// [`ContextAction::AuthRequested`] just as this side would if the
    /// roles were reversed; each side calls `accept_auth`/`reject_auth`
    /// itself once it decides to honor what it received. No local
    /// transition happens here: entering `ready` is always the caller's
    /// explicit decision.
    ///
    /// # Errors
    ///
    /// [`ContextError::Protocol`] unless the context is in `auth`.
    pub fn send_auth(&mut self, credentials: Vec<u8>) -> Result<ContextAction, ContextError> {
        if self.protocol_state() != topology::AUTH {
            return Err(ContextError::Protocol {
                state: self.protocol_state_name().to_string(),
                reason: "cannot send AUTH outside the auth state".to_string(),
            });
        }
        let sequence = self.take_sequence();
        let frame = Frame::build(MessageType::Auth, Flags::default(), sequence, credentials);
        Ok(ContextAction::SendFrame(frame))
    }

    /// Accepts a pending `AUTH` request, transitioning `auth → ready`.
    ///
    /// # Errors
    ///
    /// [`ContextError::Fsm`] if the context isn't in `auth`.
    pub fn accept_auth(&mut self) -> Result<(), ContextError> {
        self.fsm.execute_transition("to_ready", &mut ())?;
        Ok(())
    }

    /// Rejects a pending `AUTH` request, transitioning to `error`.
    ///
    /// # Errors
    ///
    /// [`ContextError::Fsm`] if the context isn't in `auth`.
    pub fn reject_auth(&mut self) -> Result<(), ContextError> {
        self.fsm.execute_transition("auth_to_error", &mut ())?;
        Ok(())
    }

    /// Feeds newly received bytes into the internal receive buffer,
    /// decoding and dispatching as many complete frames as are available.
    ///
    /// # Errors
    ///
    /// [`ContextError::Frame`] on a hard decode failure (not a short read),
    /// including a declared `payload_length` over `config.max_message_size`;
    /// the protocol transitions to `error` first when possible.
    /// [`ContextError::Protocol`] if a decoded frame's type is illegal for
    /// the current state; same transition behavior.
    pub fn receive_bytes(&mut self, bytes: &[u8], now: I) -> Result<Vec<ContextAction>, ContextError> {
        self.recv_buffer.put_slice(bytes);
        let mut actions = Vec::new();
        loop {
            match Frame::decode_with_limit(&self.recv_buffer, self.config.max_message_size) {
                Ok(frame) => {
                    let consumed = plc_proto::MessageHeader::SIZE + frame.payload.len();
                    let _ = self.recv_buffer.split_to(consumed);
                    actions.extend(self.handle_frame(frame, now)?);
                },
                Err(err) if err.is_short_read() => break,
                Err(err) => {
                    tracing::warn!(error = %err, "frame decode failed, transitioning to error");
                    self.fail(now);
                    return Err(ContextError::Frame(err));
                },
            }
        }
        Ok(actions)
    }

    fn fail(&mut self, _now: I) {
        if let Some(transition) = topology::to_error_transition(self.protocol_state()) {
            // Best-effort: if this fails too, the state stays as-is and the
            // original error is still surfaced to the caller.
            let _ = self.fsm.execute_transition(transition, &mut ());
        }
    }

    fn handle_frame(&mut self, frame: Frame, now: I) -> Result<Vec<ContextAction>, ContextError> {
        if frame.header.msg_type() == Some(MessageType::Heartbeat) {
            self.last_heartbeat_received = Some(now);
        }

        let sequence = frame.header.sequence();
        let has_pending = self.pending.contains_key(&sequence);
        let state = self.protocol_state();

        let outcome = match dispatcher::dispatch(state, &frame, has_pending, self.next_sequence) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.fail(now);
                return Err(err);
            },
        };

        if let Some(transition) = outcome.transition {
            self.fsm.execute_transition(transition, &mut ())?;
        }
        if outcome.consumed_sequence {
            self.take_sequence();
        }

        for action in &outcome.actions {
            match action {
                ContextAction::ResolveCommand { sequence, .. } | ContextAction::RejectCommand { sequence, .. } => {
                    self.pending.remove(sequence);
                },
                _ => {},
            }
        }

        Ok(outcome.actions)
    }

    /// Periodic maintenance: sweeps timed-out pending commands and, when
    /// `ready`, emits a heartbeat if the configured interval has elapsed.
    pub fn tick(&mut self, now: I) -> Vec<ContextAction>
    where
        I: std::ops::Add<Duration, Output = I>,
    {
        let mut actions = Vec::new();

        let timed_out: Vec<u32> =
            self.pending.iter().filter(|(_, entry)| now >= entry.deadline).map(|(seq, _)| *seq).collect();
        for sequence in timed_out {
            self.pending.remove(&sequence);
            tracing::warn!(sequence, "command timed out");
            actions.push(ContextAction::RejectCommand { sequence, reason: "timeout".to_string() });
        }

        if self.protocol_state() == topology::READY {
            let interval = Duration::from_millis(u64::from(self.config.heartbeat_interval_ms));
            let should_send = match self.last_heartbeat_sent {
                None => true,
                Some(last) => now - last >= interval,
            };
            if should_send {
                let sequence = self.take_sequence();
                let frame = Frame::build(MessageType::Heartbeat, Flags::default(), sequence, Vec::new());
                self.last_heartbeat_sent = Some(now);
                actions.push(ContextAction::SendFrame(frame));
            }
        }

        actions
    }

    /// Rejects every pending command with `"connection closed"` and
    /// transitions to `closed`.
    pub fn disconnect(&mut self) -> Vec<ContextAction> {
        let mut actions: Vec<ContextAction> = self
            .pending
            .drain()
            .map(|(sequence, _)| ContextAction::RejectCommand { sequence, reason: "connection closed".to_string() })
            .collect();
        if let Some(transition) = topology::to_closed_transition(self.protocol_state()) {
            let _ = self.fsm.execute_transition(transition, &mut ());
        }
        actions.push(ContextAction::Close { reason: "disconnected".to_string() });
        actions
    }
}
