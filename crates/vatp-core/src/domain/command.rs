//! The validated vehicle command vocabulary.
//!
//! The server is authoritative: sessions accept arbitrary command strings and
//! pass them through uninterpreted. This enum exists for callers (the admin
//! console, tests) that want the known vocabulary with its canonical wire
//! spelling.

use std::fmt;

/// A control command the vehicle server recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleCommand {
    SpeedUp,
    SlowDown,
    TurnLeft,
    TurnRight,
}

impl VehicleCommand {
    pub const ALL: [VehicleCommand; 4] = [
        VehicleCommand::SpeedUp,
        VehicleCommand::SlowDown,
        VehicleCommand::TurnLeft,
        VehicleCommand::TurnRight,
    ];

    /// Canonical value of the `Command` header.
    pub fn wire_name(&self) -> &'static str {
        match self {
            VehicleCommand::SpeedUp => "SPEED_UP",
            VehicleCommand::SlowDown => "SLOW_DOWN",
            VehicleCommand::TurnLeft => "TURN_LEFT",
            VehicleCommand::TurnRight => "TURN_RIGHT",
        }
    }

    /// Recognizes both spellings the server accepts (`SPEED_UP` and
    /// `SPEED UP`), case-insensitively. Returns `None` for anything outside
    /// the vocabulary.
    pub fn parse(input: &str) -> Option<VehicleCommand> {
        let normalized = input.trim().to_ascii_uppercase().replace(' ', "_");
        match normalized.as_str() {
            "SPEED_UP" => Some(VehicleCommand::SpeedUp),
            "SLOW_DOWN" => Some(VehicleCommand::SlowDown),
            "TURN_LEFT" => Some(VehicleCommand::TurnLeft),
            "TURN_RIGHT" => Some(VehicleCommand::TurnRight),
            _ => None,
        }
    }
}

impl fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
