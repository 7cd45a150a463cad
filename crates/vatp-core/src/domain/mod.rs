//! Domain types for the vehicle remote-control clients.
//!
//! Pure business state with no infrastructure dependencies: session identity
//! and lifecycle, the telemetry snapshot, and the command vocabulary. Code
//! here compiles and tests without a socket in sight; the client crate layers
//! transport and sessions on top.

pub mod command;
pub mod session;
pub mod telemetry;
