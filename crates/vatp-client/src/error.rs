//! Error taxonomy for the protocol sessions.
//!
//! Failures are always returned as typed outcomes; nothing in this crate
//! panics on a protocol or network problem. There is no malformed-response
//! error: decoding is tolerant, and absent or unparseable fields simply stay
//! optional.

use thiserror::Error;
use vatp_core::ConnectionState;

use crate::transport::TransportError;

/// Errors surfaced by the admin and observer sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation was invoked in a state that does not allow it. Purely a
    /// local precondition violation: nothing was sent on the wire.
    #[error("operation not valid in session state {state:?}")]
    NotConnected { state: ConnectionState },

    /// The transport failed; the session has returned to `Disconnected`.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
