// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime notification client.
//!
//! [`NotificationClient::connect`] spawns a connection task that owns the one
//! live socket and returns a handle plus the receiving end of a typed event
//! channel. On every new socket the task sends `authenticate` with the session
//! token and forwards domain events only after `authenticated` arrives on that
//! same socket. Lost connections are retried with a doubling delay until the
//! retry budget is spent, after which [`RealtimeEvent::ReconnectFailed`] is
//! emitted and the task waits for an explicit [`NotificationClient::reconnect`].
//! An `auth_error` closes the socket and also waits for an explicit reconnect.
//! A handshake that does not finish within `connect_timeout` counts as a
//! failed attempt.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use futureguide_config::model::RealtimeConfig;
use futureguide_core::{FutureGuideError, NotificationEvent};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::{ClientFrame, ServerFrame};
use super::state::ConnectionState;

/// Connection parameters and retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeSettings {
    pub url: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    /// Bound on TCP connect plus the WebSocket upgrade.
    pub connect_timeout: Duration,
    pub event_buffer: usize,
}

impl RealtimeSettings {
    /// Delay before reconnection attempt `attempt` (1-based): the base delay
    /// doubled per attempt, capped at `max_reconnect_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.reconnect_delay
            .saturating_mul(factor)
            .min(self.max_reconnect_delay)
    }
}

impl From<&RealtimeConfig> for RealtimeSettings {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            max_reconnect_delay: Duration::from_millis(config.max_reconnect_delay_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            event_buffer: config.event_buffer,
        }
    }
}

/// Everything the subscriber can observe.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// A socket opened; `authenticate` is sent next.
    Connected,
    Disconnected { reason: String },
    Authenticated,
    /// The server rejected the token. No automatic retry follows.
    AuthError { message: String },
    Notification(NotificationEvent),
    /// The retry budget is spent.
    ReconnectFailed { attempts: u32 },
}

impl RealtimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::Connected => "connected",
            RealtimeEvent::Disconnected { .. } => "disconnected",
            RealtimeEvent::Authenticated => "authenticated",
            RealtimeEvent::AuthError { .. } => "auth_error",
            RealtimeEvent::Notification(event) => event.name(),
            RealtimeEvent::ReconnectFailed { .. } => "reconnect_failed",
        }
    }
}

#[derive(Debug)]
enum Command {
    Reconnect,
}

/// Handle to the connection task. Dropping it stops the task.
#[derive(Debug)]
pub struct NotificationClient {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl NotificationClient {
    /// Start connecting. Must be called inside a tokio runtime.
    pub fn connect(
        settings: RealtimeSettings,
        token: SecretString,
    ) -> (Self, mpsc::Receiver<RealtimeEvent>) {
        let (event_tx, event_rx) = mpsc::channel(settings.event_buffer.max(1));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let connection = Connection {
            settings,
            token,
            events: event_tx,
            state: state_tx,
            commands: command_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(connection.run());

        (
            Self {
                commands: command_tx,
                state: state_rx,
                cancel,
                task: Some(task),
            },
            event_rx,
        )
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Tear down the live socket, if any, and connect again with a fresh
    /// retry budget.
    pub fn reconnect(&self) -> Result<(), FutureGuideError> {
        match self.commands.try_send(Command::Reconnect) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(FutureGuideError::Realtime {
                message: "notification client has stopped".to_string(),
                source: None,
            }),
        }
    }

    /// Close the socket and stop reconnecting. Waits for the task to finish.
    pub async fn disconnect(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("notification task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for NotificationClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum SessionEnd {
    Cancelled,
    ReconnectRequested,
    AuthRejected,
    Lost(String),
}

/// The connection task's state. Owns the socket for its whole life.
struct Connection {
    settings: RealtimeSettings,
    token: SecretString,
    events: mpsc::Sender<RealtimeEvent>,
    state: watch::Sender<ConnectionState>,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
}

impl Connection {
    async fn run(mut self) {
        let mut attempts = 0u32;

        loop {
            self.set_state(ConnectionState::Connecting);
            // Commands are served during the handshake too: a reconnect
            // restarts it with a fresh budget.
            let handshake = tokio::time::timeout(
                self.settings.connect_timeout,
                connect_async(self.settings.url.as_str()),
            );
            let connected = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(Command::Reconnect) => {
                        debug!("reconnect requested during handshake, restarting");
                        attempts = 0;
                        continue;
                    }
                    None => break,
                },
                result = handshake => match result {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(_) => Err(format!(
                        "handshake did not complete within {}ms",
                        self.settings.connect_timeout.as_millis()
                    )),
                },
            };

            let failure = match connected {
                Ok((socket, _response)) => {
                    attempts = 0;
                    self.set_state(ConnectionState::Connected);
                    info!(url = %self.settings.url, "realtime connected");
                    self.emit(RealtimeEvent::Connected);

                    let end = self.session(socket).await;
                    self.set_state(ConnectionState::Disconnected);
                    match end {
                        SessionEnd::Cancelled => {
                            self.emit(RealtimeEvent::Disconnected {
                                reason: "client disconnected".to_string(),
                            });
                            break;
                        }
                        SessionEnd::ReconnectRequested => {
                            self.emit(RealtimeEvent::Disconnected {
                                reason: "reconnect requested".to_string(),
                            });
                            continue;
                        }
                        SessionEnd::AuthRejected => {
                            self.emit(RealtimeEvent::Disconnected {
                                reason: "authentication rejected".to_string(),
                            });
                            if self.wait_for_reconnect().await {
                                continue;
                            }
                            break;
                        }
                        SessionEnd::Lost(reason) => {
                            warn!(%reason, "realtime connection lost");
                            self.emit(RealtimeEvent::Disconnected {
                                reason: reason.clone(),
                            });
                            reason
                        }
                    }
                }
                Err(reason) => {
                    self.set_state(ConnectionState::Disconnected);
                    warn!(url = %self.settings.url, attempt = attempts, "realtime connect failed: {reason}");
                    reason
                }
            };

            if attempts >= self.settings.max_reconnect_attempts {
                warn!(attempts, "realtime reconnection budget spent: {failure}");
                self.emit(RealtimeEvent::ReconnectFailed { attempts });
                if self.wait_for_reconnect().await {
                    attempts = 0;
                    continue;
                }
                break;
            }

            attempts += 1;
            let delay = self.settings.backoff(attempts);
            debug!(
                attempt = attempts,
                max_attempts = self.settings.max_reconnect_attempts,
                delay_ms = delay.as_millis() as u64,
                "scheduling realtime reconnect"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(Command::Reconnect) => attempts = 0,
                    None => break,
                },
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(ConnectionState::Disconnected);
        debug!("realtime connection task stopped");
    }

    /// Drive one socket from handshake to close.
    async fn session(&mut self, socket: WebSocketStream<MaybeTlsStream<TcpStream>>) -> SessionEnd {
        let (mut sink, mut stream) = socket.split();

        self.set_state(ConnectionState::Authenticating);
        let frame = match (ClientFrame::Authenticate {
            token: self.token.expose_secret(),
        })
        .encode()
        {
            Ok(frame) => frame,
            Err(e) => return SessionEnd::Lost(e.to_string()),
        };
        if let Err(e) = sink.send(Message::Text(frame.into())).await {
            return SessionEnd::Lost(format!("failed to send authenticate: {e}"));
        }
        debug!("sent authenticate");

        let mut authenticated = false;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Cancelled;
                }
                command = self.commands.recv() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return match command {
                        Some(Command::Reconnect) => SessionEnd::ReconnectRequested,
                        None => SessionEnd::Cancelled,
                    };
                }
                message = stream.next() => match message {
                    None => return SessionEnd::Lost("connection closed".to_string()),
                    Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.as_str().to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "server closed connection".to_string());
                        return SessionEnd::Lost(reason);
                    }
                    Some(Ok(Message::Text(text))) => match ServerFrame::parse(text.as_str()) {
                        Ok(ServerFrame::Authenticated) => {
                            if !authenticated {
                                authenticated = true;
                                self.set_state(ConnectionState::Authenticated);
                                info!("realtime authenticated");
                                self.emit(RealtimeEvent::Authenticated);
                            }
                        }
                        Ok(ServerFrame::AuthError { message }) => {
                            warn!(%message, "realtime authentication rejected");
                            self.emit(RealtimeEvent::AuthError { message });
                            let _ = sink.send(Message::Close(None)).await;
                            return SessionEnd::AuthRejected;
                        }
                        Ok(ServerFrame::Notification(event)) if authenticated => {
                            debug!(event = event.name(), job_id = event.job_id(), "notification received");
                            self.emit(RealtimeEvent::Notification(event));
                        }
                        Ok(ServerFrame::Notification(event)) => {
                            debug!(event = event.name(), "dropping event received before authentication");
                        }
                        Ok(ServerFrame::Unknown(name)) => {
                            debug!(event = %name, "ignoring unhandled event");
                        }
                        Err(e) => warn!("ignoring malformed frame: {e}"),
                    },
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    /// Park until the handle asks for a reconnect (`true`) or goes away.
    async fn wait_for_reconnect(&mut self) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            command = self.commands.recv() => matches!(command, Some(Command::Reconnect)),
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "realtime state");
        }
    }

    /// Deliver without waiting; a full or closed channel drops the event.
    fn emit(&self, event: RealtimeEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = event.name(), "event channel full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                debug!(event = event.name(), "event receiver gone, dropping event");
            }
        }
    }
}
