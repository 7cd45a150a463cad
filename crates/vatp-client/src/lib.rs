//! vatp-client library entry point.
//!
//! Client library for the VATP/1.0 autonomous-vehicle server, shared by the
//! `vatp-admin` and `vatp-observer` binaries and the integration tests in
//! `tests/`.
//!
//! Two session variants cover the two roles the server knows:
//!
//! - [`admin::AdminSession`] – connects, authenticates, and issues control
//!   commands synchronously: every operation awaits the paired server
//!   response.
//! - [`observer::ObserverSession`] – connects unauthenticated, then a
//!   background listener owns the socket's read side and dispatches
//!   telemetry and acknowledgement events over a channel until disconnect.
//!
//! Both are built from the same [`transport::Transport`] (framed TCP) and
//! the codec in `vatp-core`. Presentation is out of scope: the sessions
//! report typed events and results, and the binaries render them.

pub mod admin;
pub mod config;
pub mod error;
pub mod observer;
pub mod transport;

pub use admin::AdminSession;
pub use config::{ConfigFile, SessionConfig};
pub use error::SessionError;
pub use observer::{ObserverEvent, ObserverSession};
pub use transport::{Transport, TransportError};
