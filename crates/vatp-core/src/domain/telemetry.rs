//! Vehicle telemetry snapshot and battery severity classification.
//!
//! The server pushes telemetry as VATP blocks tagged `TELEMETRY_DATA`,
//! carrying any subset of the `Speed`, `Battery`, `Temperature`, `Direction`
//! and `Moving` headers. Fields are independently optional: a partial block
//! updates only the fields it carries and everything else keeps its last
//! known value.
//!
//! Values arrive with display units attached (`"42 km/h"`, `"15%"`,
//! `"23.50 C"`), so numeric fields parse the leading number and ignore the
//! rest. An unparseable value leaves its field untouched rather than failing
//! the block.

use serde::{Deserialize, Serialize};

use crate::protocol::messages::{headers, VatpMessage};

/// Three-tier battery classification surfaced with every telemetry event.
///
/// The tier is part of the event payload, not a rendering choice: consumers
/// select behaviour (alerts, colour, throttling) on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatterySeverity {
    Normal,
    Warning,
    Critical,
}

impl BatterySeverity {
    /// Classifies a battery percentage: `< 20` critical, `< 50` warning,
    /// otherwise normal.
    pub fn of_percent(percent: f64) -> BatterySeverity {
        if percent < 20.0 {
            BatterySeverity::Critical
        } else if percent < 50.0 {
            BatterySeverity::Warning
        } else {
            BatterySeverity::Normal
        }
    }
}

/// Last known vehicle state, merged from every telemetry block received.
///
/// Starts fully unknown and is reset to unknown on disconnect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub speed_kmh: Option<f64>,
    pub battery_percent: Option<f64>,
    pub temperature_c: Option<f64>,
    pub direction: Option<String>,
    pub moving: Option<bool>,
}

impl TelemetrySnapshot {
    /// Merges the telemetry headers of `message` into this snapshot.
    ///
    /// Only headers present in the block change fields; unknown header names
    /// are ignored for forward compatibility.
    pub fn apply(&mut self, message: &VatpMessage) {
        for (name, value) in message.headers() {
            match name {
                headers::SPEED => {
                    if let Some(v) = leading_number(value) {
                        self.speed_kmh = Some(v);
                    }
                }
                headers::BATTERY => {
                    if let Some(v) = leading_number(value) {
                        self.battery_percent = Some(v);
                    }
                }
                headers::TEMPERATURE => {
                    if let Some(v) = leading_number(value) {
                        self.temperature_c = Some(v);
                    }
                }
                headers::DIRECTION => {
                    if !value.is_empty() {
                        self.direction = Some(value.to_string());
                    }
                }
                headers::MOVING => {
                    // Wire values are "Yes"/"No", compared case-insensitively.
                    self.moving = Some(value.eq_ignore_ascii_case("yes"));
                }
                _ => {}
            }
        }
    }

    /// Severity of the last reported battery level, if any was reported yet.
    pub fn battery_severity(&self) -> Option<BatterySeverity> {
        self.battery_percent.map(BatterySeverity::of_percent)
    }

    /// Returns every field to the unknown state.
    pub fn reset(&mut self) {
        *self = TelemetrySnapshot::default();
    }
}

/// Parses the leading number of a telemetry value (`"42 km/h"` → 42.0,
/// `"15%"` → 15.0, `"-3.5 C"` → -3.5).
fn leading_number(value: &str) -> Option<f64> {
    let value = value.trim_start();
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
