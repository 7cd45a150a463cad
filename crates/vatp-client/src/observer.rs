//! Observer protocol session and the background telemetry listener.
//!
//! State machine:
//!
//! ```text
//! Disconnected → Connecting → Connected → Listening → Closing → Disconnected
//! ```
//!
//! Observers never authenticate: CONNECT carries only the `User-Type` and
//! `Username` headers, and the server starts pushing telemetry on its own
//! once the handshake completes.
//!
//! # Concurrency
//!
//! `connect` performs the handshake on the caller's task, then hands the
//! framed read half to one spawned task – the telemetry listener – which owns
//! it for the remainder of the session. The session keeps the write half for
//! the eventual DISCONNECT send, so socket access is serialized structurally:
//! one reader, one writer, no shared handle.
//!
//! Events flow to the caller over a bounded mpsc channel taken at
//! construction, which gives single-producer ordering per session. Delivering
//! them onto a UI thread is the consumer's concern.
//!
//! Cancellation is cooperative: `disconnect` flips a watch signal and the
//! listener exits at its next loop turn, dropping the read half and with it
//! the socket. The listener is never aborted mid-read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vatp_core::protocol::messages::{headers, markers};
use vatp_core::{
    BatterySeverity, ConnectionState, Method, Role, SessionIdentity, TelemetrySnapshot,
    VatpMessage,
};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::transport::{FrameReader, FrameWriter, Transport};

/// How long the DISCONNECT notice gets to reach the wire before the socket
/// is shut down.
const DISCONNECT_GRACE: Duration = Duration::from_millis(100);

/// Capacity of the event channel between listener and caller.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events the observer session reports to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    /// A telemetry block arrived; `snapshot` is the merged vehicle state and
    /// `battery` its severity tier (absent until the first battery report).
    Telemetry {
        snapshot: TelemetrySnapshot,
        battery: Option<BatterySeverity>,
    },
    /// The server acknowledged a request (`RESPONSE_OK`).
    Acknowledged,
    /// The stream ended or failed while the session was active. Emitted at
    /// most once per session; the listener never restarts itself.
    ConnectionLost,
}

/// Subscribes to the live telemetry stream of the vehicle server.
pub struct ObserverSession {
    config: SessionConfig,
    state: ConnectionState,
    identity: Option<SessionIdentity>,
    writer: Option<FrameWriter<OwnedWriteHalf>>,
    listener: Option<JoinHandle<()>>,
    stop: Option<watch::Sender<bool>>,
    active: Arc<AtomicBool>,
    snapshot: Arc<Mutex<TelemetrySnapshot>>,
    events: mpsc::Sender<ObserverEvent>,
}

impl ObserverSession {
    /// Creates a disconnected session and the one event receiver for its
    /// lifetime. Take the receiver before calling [`ObserverSession::connect`].
    pub fn new(config: SessionConfig) -> (ObserverSession, mpsc::Receiver<ObserverEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let session = ObserverSession {
            config,
            state: ConnectionState::Disconnected,
            identity: None,
            writer: None,
            listener: None,
            stop: None,
            active: Arc::new(AtomicBool::new(false)),
            snapshot: Arc::new(Mutex::new(TelemetrySnapshot::default())),
            events,
        };
        (session, rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The current merged vehicle state.
    pub async fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.lock().await.clone()
    }

    /// Performs the CONNECT handshake and starts the telemetry listener.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.state != ConnectionState::Disconnected {
            return Err(SessionError::NotConnected { state: self.state });
        }
        self.state = ConnectionState::Connecting;

        let mut transport = match Transport::open(&self.config.host, self.config.port).await {
            Ok(t) => t,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e.into());
            }
        };
        info!("connected to vehicle server at {}", transport.peer());

        let connect_msg = VatpMessage::request(Method::Connect)
            .with_header(headers::USER_TYPE, Role::Observer.wire_name())
            .with_header(headers::USERNAME, &self.config.username);

        let ack = match transport.request(&connect_msg).await {
            Ok(ack) => ack,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e.into());
            }
        };
        debug!("handshake ack: {}", ack.text());
        self.state = ConnectionState::Connected;

        let (reader, writer) = transport.into_split();
        let (stop_tx, stop_rx) = watch::channel(false);
        self.active.store(true, Ordering::Release);

        self.listener = Some(tokio::spawn(telemetry_loop(
            reader,
            self.events.clone(),
            stop_rx,
            Arc::clone(&self.active),
            Arc::clone(&self.snapshot),
        )));
        self.writer = Some(writer);
        self.stop = Some(stop_tx);
        self.identity = Some(SessionIdentity {
            role: Role::Observer,
            username: self.config.username.clone(),
            auth_token: None,
        });
        self.state = ConnectionState::Listening;
        info!("telemetry listener started");
        Ok(())
    }

    /// Stops the listener, sends the DISCONNECT notice, and closes the
    /// socket. Safe to call in any state; repeated calls are no-ops.
    pub async fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.state = ConnectionState::Closing;

        // Mark the session inactive first so the listener's exit is silent
        // rather than a ConnectionLost report.
        self.active.store(false, Ordering::Release);
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }

        if let Some(mut writer) = self.writer.take() {
            let bye = VatpMessage::request(Method::Disconnect)
                .with_header(headers::USERNAME, &self.config.username);
            if let Err(e) = writer.send(&bye).await {
                debug!("disconnect notice not delivered: {e}");
            }
            // Give the in-flight send a moment to land, then close. The close
            // is mandatory on every path: it is what guarantees teardown even
            // against a permanently silent server.
            tokio::time::sleep(DISCONNECT_GRACE).await;
            let _ = writer.shutdown().await;
        }

        if let Some(listener) = self.listener.take() {
            if listener.await.is_err() {
                warn!("telemetry listener ended abnormally");
            }
        }

        self.snapshot.lock().await.reset();
        self.identity = None;
        self.state = ConnectionState::Disconnected;
        info!("observer session disconnected");
    }
}

/// Background read loop: owns the read half for the lifetime of the
/// `Listening` state and classifies every inbound block.
async fn telemetry_loop(
    mut reader: FrameReader<OwnedReadHalf>,
    events: mpsc::Sender<ObserverEvent>,
    mut stop: watch::Receiver<bool>,
    active: Arc<AtomicBool>,
    snapshot: Arc<Mutex<TelemetrySnapshot>>,
) {
    loop {
        let message = tokio::select! {
            // Cooperative stop: also fires when the session is dropped.
            _ = stop.changed() => break,
            read = reader.read_message() => match read {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!("server closed the telemetry stream");
                    break;
                }
                Err(e) => {
                    if active.load(Ordering::Acquire) {
                        warn!("telemetry read failed: {e}");
                    }
                    break;
                }
            },
        };

        if message.contains(markers::TELEMETRY_DATA) {
            let update = {
                let mut snap = snapshot.lock().await;
                snap.apply(&message);
                ObserverEvent::Telemetry {
                    snapshot: snap.clone(),
                    battery: snap.battery_severity(),
                }
            };
            if !deliver(&events, &mut stop, update).await {
                break;
            }
        } else if message.contains(markers::RESPONSE_OK) {
            if !deliver(&events, &mut stop, ObserverEvent::Acknowledged).await {
                break;
            }
        }
        // Anything else is ignored silently: future servers may push message
        // kinds this client does not know.
    }

    // Report ConnectionLost exactly once, and only when the loop ended while
    // the session still considered itself active.
    if active.swap(false, Ordering::AcqRel) {
        let _ = events.send(ObserverEvent::ConnectionLost).await;
    }
}

/// Sends one event unless the stop signal fires first. Returns `false` when
/// the loop should exit (stop requested or receiver gone).
async fn deliver(
    events: &mpsc::Sender<ObserverEvent>,
    stop: &mut watch::Receiver<bool>,
    event: ObserverEvent,
) -> bool {
    tokio::select! {
        _ = stop.changed() => false,
        sent = events.send(event) => sent.is_ok(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    fn test_config() -> SessionConfig {
        SessionConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            username: "observer".to_string(),
            password: None,
        }
    }

    #[tokio::test]
    async fn test_new_session_starts_disconnected_with_unknown_snapshot() {
        // Arrange / Act
        let (session, _rx) = ObserverSession::new(test_config());

        // Assert
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.snapshot().await, TelemetrySnapshot::default());
    }

    #[tokio::test]
    async fn test_connect_failure_returns_session_to_disconnected() {
        let (mut session, _rx) = ObserverSession::new(test_config());

        let result = session.connect().await;

        assert!(matches!(
            result,
            Err(SessionError::Transport(TransportError::ConnectFailed { .. }))
        ));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_a_no_op() {
        let (mut session, _rx) = ObserverSession::new(test_config());

        session.disconnect().await;
        session.disconnect().await;

        assert_eq!(session.state(), ConnectionState::Disconnected);
    }
}
