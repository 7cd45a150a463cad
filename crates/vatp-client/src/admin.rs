//! Admin protocol session: CONNECT → AUTH → COMMAND* → DISCONNECT.
//!
//! The admin session is fully sequential – every operation awaits the paired
//! server response before returning, so no background task is involved.
//!
//! State machine:
//!
//! ```text
//! Disconnected → Connecting → Connected → Authenticated → (commands) → Closing → Disconnected
//! ```
//!
//! # Token discovery
//!
//! The AUTH response carries the session token in free-form text, and the
//! server omits it entirely on some paths. The session scans every decoded
//! line for a `TOKEN_` substring; when none is found it proceeds with the
//! placeholder [`FALLBACK_AUTH_TOKEN`] instead of aborting, since the server
//! accepts commands either way.

use tracing::{debug, info, warn};
use vatp_core::protocol::messages::headers;
use vatp_core::{ConnectionState, Method, Role, SessionIdentity, VatpMessage};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::transport::Transport;

/// Placeholder token used when the server does not issue one during AUTH.
pub const FALLBACK_AUTH_TOKEN: &str = "TOKEN_FAKE";

/// Issues authenticated control commands to the vehicle server.
pub struct AdminSession {
    config: SessionConfig,
    state: ConnectionState,
    transport: Option<Transport>,
    identity: Option<SessionIdentity>,
}

impl AdminSession {
    /// Creates a disconnected session. Nothing touches the network until
    /// [`AdminSession::connect`].
    pub fn new(config: SessionConfig) -> AdminSession {
        AdminSession {
            config,
            state: ConnectionState::Disconnected,
            transport: None,
            identity: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The active session token, once authenticated.
    pub fn auth_token(&self) -> Option<&str> {
        self.identity.as_ref()?.auth_token.as_deref()
    }

    /// Opens the transport, performs the CONNECT handshake, then
    /// authenticates and stores the session token.
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

        let password = self.config.password.clone().unwrap_or_default();
        let connect_msg = VatpMessage::request(Method::Connect)
            .with_header(headers::USER_TYPE, Role::Admin.wire_name())
            .with_header(headers::USERNAME, &self.config.username)
            .with_header(headers::PASSWORD, &password);

        let ack = match transport.request(&connect_msg).await {
            Ok(ack) => ack,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e.into());
            }
        };
        debug!("handshake ack: {}", ack.text());
        self.state = ConnectionState::Connected;

        let auth_msg = VatpMessage::request(Method::Auth)
            .with_header(headers::USERNAME, &self.config.username)
            .with_header(headers::PASSWORD, &password);

        let auth_response = match transport.request(&auth_msg).await {
            Ok(response) => response,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e.into());
            }
        };

        let token = match auth_response.auth_token() {
            Some(token) => {
                info!("session token issued: {token}");
                token
            }
            None => {
                warn!("server did not issue a token; proceeding with placeholder");
                FALLBACK_AUTH_TOKEN.to_string()
            }
        };

        self.identity = Some(SessionIdentity {
            role: Role::Admin,
            username: self.config.username.clone(),
            auth_token: Some(token),
        });
        self.transport = Some(transport);
        self.state = ConnectionState::Authenticated;
        Ok(())
    }

    /// Sends a COMMAND frame and returns the server response verbatim.
    ///
    /// The validated vocabulary is [`vatp_core::VehicleCommand`], but any
    /// string passes through uninterpreted – the server is authoritative.
    /// Outside the `Authenticated` state this fails locally with
    /// `NotConnected` and produces no network traffic.
    pub async fn send_command(&mut self, command: &str) -> Result<VatpMessage, SessionError> {
        let (username, token) = self.credentials()?;
        let msg = VatpMessage::request(Method::Command)
            .with_header(headers::USERNAME, &username)
            .with_header(headers::AUTH_TOKEN, &token)
            .with_header(headers::COMMAND, command);
        self.exchange(msg).await
    }

    /// Requests a one-shot telemetry report over the command channel.
    pub async fn request_telemetry(&mut self) -> Result<VatpMessage, SessionError> {
        let (username, token) = self.credentials()?;
        let msg = VatpMessage::request(Method::GetTelemetry)
            .with_header(headers::USERNAME, &username)
            .with_header(headers::AUTH_TOKEN, &token);
        self.exchange(msg).await
    }

    /// Requests the server's roster of connected users.
    pub async fn list_users(&mut self) -> Result<VatpMessage, SessionError> {
        let (username, token) = self.credentials()?;
        let msg = VatpMessage::request(Method::ListUsers)
            .with_header(headers::USERNAME, &username)
            .with_header(headers::AUTH_TOKEN, &token);
        self.exchange(msg).await
    }

    /// Sends the DISCONNECT notice and closes the transport. Safe to call in
    /// any state; repeated calls are no-ops.
    pub async fn disconnect(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            self.state = ConnectionState::Disconnected;
            self.identity = None;
            return;
        };
        self.state = ConnectionState::Closing;

        let bye = VatpMessage::request(Method::Disconnect)
            .with_header(headers::USERNAME, &self.config.username);
        if let Err(e) = transport.send(&bye).await {
            debug!("disconnect notice not delivered: {e}");
        }
        // The socket closes whether or not the notice landed.
        transport.close().await;

        self.identity = None;
        self.state = ConnectionState::Disconnected;
        info!("admin session disconnected");
    }

    fn credentials(&self) -> Result<(String, String), SessionError> {
        if self.state != ConnectionState::Authenticated {
            return Err(SessionError::NotConnected { state: self.state });
        }
        let Some(identity) = &self.identity else {
            return Err(SessionError::NotConnected { state: self.state });
        };
        let token = identity.auth_token.clone().unwrap_or_default();
        Ok((identity.username.clone(), token))
    }

    /// Runs one request/response exchange. A transport failure tears the
    /// session down to `Disconnected`.
    async fn exchange(&mut self, msg: VatpMessage) -> Result<VatpMessage, SessionError> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(SessionError::NotConnected { state: self.state });
        };
        match transport.request(&msg).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!("transport failed mid-session: {e}");
                self.fail();
                Err(e.into())
            }
        }
    }

    fn fail(&mut self) {
        self.transport = None;
        self.identity = None;
        self.state = ConnectionState::Disconnected;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
