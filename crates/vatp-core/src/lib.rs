//! # vatp-core
//!
//! Shared library for the VATP remote-control clients containing the
//! protocol codec, message types, and vehicle-domain entities.
//!
//! This crate is used by both the admin and observer client applications.
//! It has zero dependencies on sockets, async runtimes, or UI frameworks.
//!
//! # Architecture overview
//!
//! An autonomous-vehicle server exposes a small line-oriented text protocol
//! ("VATP/1.0") over TCP. Two kinds of client talk to it: an *admin* that
//! authenticates and issues control commands, and an *observer* that
//! passively subscribes to the telemetry stream the server pushes.
//!
//! This crate defines:
//!
//! - **`protocol`** – How text travels over the wire. Requests are rendered
//!   as CRLF-terminated header blocks and inbound blocks are decoded back by
//!   a tolerant, stateful line accumulator.
//!
//! - **`domain`** – Session identity and lifecycle, the merged
//!   [`TelemetrySnapshot`], the battery severity tiers, and the command
//!   vocabulary the server recognizes.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `vatp_core::VatpMessage` instead of `vatp_core::protocol::messages::VatpMessage`.
pub use domain::command::VehicleCommand;
pub use domain::session::{ConnectionState, Role, SessionIdentity};
pub use domain::telemetry::{BatterySeverity, TelemetrySnapshot};
pub use protocol::codec::{decode_block, encode, BlockDecoder};
pub use protocol::messages::{Method, VatpMessage, PROTOCOL_VERSION};
