//! The client orchestrator: owns the transport and the protocol context,
//! applies reconnect policy, queues outbound commands while disconnected,
//! and resolves pending responses by sequence number.
//!
//! The orchestrator is the only piece of this crate that touches `tokio` —
//! `plc-core` stays synchronous and sans-IO; this module is the "outer
//! loop" that drives it and owns the actual connection.

use std::{collections::HashMap, time::Duration};

use plc_core::{ContextAction, ContextConfig, ProtocolContext};
use plc_proto::Frame;
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};

use crate::{connector::Connector, error::ClientError, transport::Transport};

type CommandResult = Result<Vec<u8>, ClientError>;

/// Backoff applied before the `n`th reconnect attempt (1-indexed, linear).
fn reconnect_backoff(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt))
}

enum ClientRequest {
    Command { payload: Vec<u8>, responder: oneshot::Sender<CommandResult> },
    Shutdown,
}

/// What the run loop's `select!` woke up for.
enum Event {
    Request(Option<ClientRequest>),
    Frame(Result<Option<Frame>, crate::error::TransportError>),
    Tick,
}

/// A cheap, cloneable handle for issuing commands to a running
/// [`ClientOrchestrator`] and asking it to shut down.
#[derive(Clone)]
pub struct ClientHandle {
    requests: mpsc::UnboundedSender<ClientRequest>,
}

impl ClientHandle {
    /// Sends a command and awaits its response (or rejection).
    ///
    /// # Errors
    ///
    /// [`ClientError::ShuttingDown`] if the orchestrator has already
    /// stopped; otherwise whatever error the orchestrator resolved the
    /// command with (timeout, connection closed, ...).
    pub async fn send_command(&self, payload: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        let (responder, receiver) = oneshot::channel();
        self.requests
            .send(ClientRequest::Command { payload, responder })
            .map_err(|_| ClientError::ShuttingDown)?;
        receiver.await.map_err(|_| ClientError::ShuttingDown)?
    }

    /// Disables reconnect, stops heartbeats, and drains the outbound queue
    /// with rejections once the orchestrator observes this request.
    pub fn shutdown(&self) {
        let _ = self.requests.send(ClientRequest::Shutdown);
    }
}

struct PendingCommand {
    payload: Vec<u8>,
    responder: oneshot::Sender<CommandResult>,
}

/// Drives one logical connection: reconnect with linear backoff, an
/// outbound queue while disconnected, and a pending-response table keyed by
/// sequence number.
pub struct ClientOrchestrator<C: Connector> {
    connector: C,
    transport: Option<C::Transport>,
    context: ProtocolContext<Instant>,
    config: ContextConfig,
    waiters: HashMap<u32, oneshot::Sender<CommandResult>>,
    outbound_queue: Vec<PendingCommand>,
    reconnect_attempts: u32,
    shutting_down: bool,
    auth_sent: bool,
}

impl<C: Connector> ClientOrchestrator<C> {
    /// Connects, performs the handshake, and spawns the driving task.
    ///
    /// # Errors
    ///
    /// Whatever the first connection attempt or handshake fails with.
    pub async fn spawn(
        mut connector: C,
        config: ContextConfig,
    ) -> Result<(ClientHandle, tokio::task::JoinHandle<Result<(), ClientError>>), ClientError>
    where
        C: 'static,
        C::Transport: 'static,
    {
        let transport = connector.connect().await?;
        let mut context = ProtocolContext::new(config.clone())?;
        let now = Instant::now();
        if let ContextAction::SendFrame(hello) = context.begin_handshake(now)? {
            let mut orchestrator = Self {
                connector,
                transport: Some(transport),
                context,
                config,
                waiters: HashMap::new(),
                outbound_queue: Vec::new(),
                reconnect_attempts: 0,
                shutting_down: false,
                auth_sent: false,
            };
            orchestrator.send_frame(hello).await?;

            let (tx, rx) = mpsc::unbounded_channel();
            let handle = ClientHandle { requests: tx };
            let join = tokio::spawn(async move { orchestrator.run(rx).await });
            Ok((handle, join))
        } else {
            unreachable!("begin_handshake always returns SendFrame")
        }
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), ClientError> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(ClientError::Transport(crate::error::TransportError::Closed));
        };
        transport.send(frame).await.map_err(ClientError::from)
    }

    async fn run(&mut self, mut requests: mpsc::UnboundedReceiver<ClientRequest>) -> Result<(), ClientError> {
        loop {
            if self.shutting_down {
                self.drain_outbound_queue(ClientError::ShuttingDown);
                self.reject_all_pending("shutting down");
                return Ok(());
            }

            // `transport` is taken out of `self` for the duration of the
            // select so its borrow doesn't overlap with the `&mut self`
            // handler calls below; it's put back immediately after.
            let Some(mut transport) = self.transport.take() else {
                self.reconnect().await?;
                continue;
            };

            let event = tokio::select! {
                biased;
                request = requests.recv() => Event::Request(request),
                frame = transport.recv() => Event::Frame(frame),
                () = tokio::time::sleep(Duration::from_millis(50)) => Event::Tick,
            };
            self.transport = Some(transport);

            match event {
                Event::Request(Some(ClientRequest::Command { payload, responder })) => {
                    self.handle_command_request(payload, responder).await;
                },
                Event::Request(Some(ClientRequest::Shutdown) | None) => self.shutting_down = true,
                Event::Frame(Ok(Some(frame))) => self.handle_inbound_frame(frame).await?,
                Event::Frame(Ok(None) | Err(_)) => self.handle_disconnect(),
                Event::Tick => self.handle_tick().await?,
            }
        }
    }

    async fn handle_command_request(&mut self, payload: Vec<u8>, responder: oneshot::Sender<CommandResult>) {
        if self.context.protocol_state_name() != "ready" {
            self.outbound_queue.push(PendingCommand { payload, responder });
            return;
        }
        let now = Instant::now();
        match self.context.send_command(payload, now) {
            Ok((sequence, ContextAction::SendFrame(frame))) => {
                self.waiters.insert(sequence, responder);
                if let Err(err) = self.send_frame(frame).await {
                    if let Some(responder) = self.waiters.remove(&sequence) {
                        let _ = responder.send(Err(err));
                    }
                    self.handle_disconnect();
                }
            },
            Ok(_) => unreachable!("send_command always returns SendFrame on success"),
            Err(err) => {
                let _ = responder.send(Err(ClientError::from(err)));
            },
        }
    }

    async fn handle_inbound_frame(&mut self, frame: Frame) -> Result<(), ClientError> {
        let now = Instant::now();
        let mut wire = Vec::new();
        frame.encode(&mut wire);
        let actions = match self.context.receive_bytes(&wire, now) {
            Ok(actions) => actions,
            Err(err) => {
                tracing::warn!(error = %err, "protocol error handling inbound frame");
                self.reject_all_pending("protocol error");
                return Err(ClientError::from(err));
            },
        };
        for action in actions {
            self.apply_action(action).await?;
        }
        Ok(())
    }

    async fn handle_tick(&mut self) -> Result<(), ClientError> {
        let now = Instant::now();
        let actions = self.context.tick(now);
        for action in actions {
            self.apply_action(action).await?;
        }
        Ok(())
    }

    async fn apply_action(&mut self, action: ContextAction) -> Result<(), ClientError> {
        match action {
            ContextAction::SendFrame(frame) => self.send_frame(frame).await?,
            ContextAction::ResolveCommand { sequence, payload } => {
                if let Some(responder) = self.waiters.remove(&sequence) {
                    let _ = responder.send(Ok(payload));
                }
            },
            ContextAction::RejectCommand { sequence, reason } => {
                if let Some(responder) = self.waiters.remove(&sequence) {
                    tracing::warn!(sequence, reason, "command rejected");
                    let _ = responder.send(Err(ClientError::Context(plc_core::ContextError::Protocol {
                        state: self.context.protocol_state_name().to_string(),
                        reason,
                    })));
                }
            },
            ContextAction::Close { reason } => {
                tracing::info!(reason, "connection closed");
                self.handle_disconnect();
            },
            // The peer's HANDSHAKE reply lands us in `auth`; send our own
            // credentials right away (`user_data`, per this client's
            // config — the context treats it as opaque, this orchestrator
            // is what chooses to use it as the AUTH payload).
            ContextAction::HandshakeReceived if self.context.protocol_state_name() == "auth" && !self.auth_sent => {
                self.auth_sent = true;
                let credentials = self.config.user_data.clone().unwrap_or_default();
                if let ContextAction::SendFrame(frame) = self.context.send_auth(credentials)? {
                    self.send_frame(frame).await?;
                }
            },
            // The peer echoing AUTH back while we're still in `auth` is its
            // acceptance; move to `ready` and flush anything queued while
            // disconnected.
            ContextAction::AuthRequested { .. } if self.context.protocol_state_name() == "auth" => {
                self.context.accept_auth()?;
                self.flush_outbound_queue().await?;
            },
            ContextAction::HandshakeReceived
            | ContextAction::AuthRequested { .. }
            | ContextAction::CommandReceived { .. }
            | ContextAction::ResponseReceived { .. }
            | ContextAction::ErrorReceived { .. }
            | ContextAction::HeartbeatReceived => {},
        }
        Ok(())
    }

    async fn flush_outbound_queue(&mut self) -> Result<(), ClientError> {
        let queued = std::mem::take(&mut self.outbound_queue);
        for PendingCommand { payload, responder } in queued {
            self.handle_command_request(payload, responder).await;
        }
        Ok(())
    }

    fn handle_disconnect(&mut self) {
        self.transport = None;
        self.reject_all_pending("connection closed");
    }

    fn reject_all_pending(&mut self, reason: &str) {
        if !self.waiters.is_empty() {
            tracing::debug!(reason, pending = self.waiters.len(), "rejecting pending commands");
        }
        for (_, responder) in self.waiters.drain() {
            let _ = responder.send(Err(ClientError::Context(plc_core::ContextError::ConnectionClosed)));
        }
    }

    fn drain_outbound_queue(&mut self, err: ClientError) {
        for PendingCommand { responder, .. } in self.outbound_queue.drain(..) {
            let _ = responder.send(Err(err.clone()));
        }
    }

    async fn reconnect(&mut self) -> Result<(), ClientError> {
        if !self.config.reconnect || self.reconnect_attempts >= self.config.max_retries {
            self.drain_outbound_queue(ClientError::ReconnectExhausted);
            self.shutting_down = true;
            return Err(ClientError::ReconnectExhausted);
        }
        self.reconnect_attempts += 1;
        let backoff = reconnect_backoff(self.reconnect_attempts);
        tracing::info!(attempt = self.reconnect_attempts, ?backoff, "reconnecting");
        tokio::time::sleep(backoff).await;

        let transport = self.connector.connect().await?;
        self.context = ProtocolContext::new(self.config.clone())?;
        self.transport = Some(transport);
        self.auth_sent = false;
        let now = Instant::now();
        if let ContextAction::SendFrame(hello) = self.context.begin_handshake(now)? {
            self.send_frame(hello).await?;
        }
        self.reconnect_attempts = 0;
        Ok(())
    }
}
