//! Session identity and connection lifecycle types.
//!
//! These are shared by both protocol session variants. The state value is
//! owned exclusively by the session that drives the connection; background
//! work observes a stop signal instead of mutating state.

use serde::{Deserialize, Serialize};

/// Role a session connects under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Authenticates and issues vehicle commands.
    Admin,
    /// Subscribes to the telemetry stream; never authenticates.
    Observer,
}

impl Role {
    /// Value of the `User-Type` header for this role.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Observer => "OBSERVER",
        }
    }
}

/// Identity established by a successful CONNECT exchange.
///
/// `auth_token` is present only for an admin after AUTH; observers never
/// carry one. Cleared on disconnect or transport failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionIdentity {
    pub role: Role,
    pub username: String,
    pub auth_token: Option<String>,
}

/// Lifecycle state of a protocol session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Admin only: AUTH completed, commands may be sent.
    Authenticated,
    /// Observer only: telemetry loop active.
    Listening,
    Closing,
}

impl ConnectionState {
    /// True for every state with a live transport.
    pub fn is_established(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Authenticated | ConnectionState::Listening
        )
    }
}
