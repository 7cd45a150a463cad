//! VATP telemetry observer entry point.
//!
//! Connects to the vehicle server as OBSERVER and prints the live telemetry
//! stream until the server goes away or the user presses Ctrl-C.
//!
//! ```text
//! vatp-observer [OPTIONS]
//!
//! Options:
//!   --host <HOST>      Server hostname or IP [default: 127.0.0.1]
//!   --port <PORT>      Server TCP port [default: 8080]
//!   --username <NAME>  Username for CONNECT [default: observer]
//!   --config <FILE>    Optional TOML config file
//! ```
//!
//! Flags also read the environment variables `VATP_HOST`, `VATP_PORT`,
//! `VATP_USERNAME`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vatp_client::config::{ConfigFile, SessionConfig, DEFAULT_HOST, DEFAULT_PORT};
use vatp_client::{ObserverEvent, ObserverSession};
use vatp_core::{BatterySeverity, TelemetrySnapshot};

/// VATP telemetry observer for the autonomous-vehicle server.
#[derive(Debug, Parser)]
#[command(
    name = "vatp-observer",
    about = "Subscribe to the live telemetry stream of the vehicle server",
    version
)]
struct Cli {
    /// Server hostname or IP address.
    #[arg(long, env = "VATP_HOST")]
    host: Option<String>,

    /// Server TCP port.
    #[arg(long, env = "VATP_PORT")]
    port: Option<u16>,

    /// Username for the CONNECT handshake.
    #[arg(long, env = "VATP_USERNAME")]
    username: Option<String>,

    /// Optional TOML config file with host/port overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => ConfigFile::default(),
    };
    let config = SessionConfig {
        host: cli.host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
        username: cli
            .username
            .or(file.username)
            .unwrap_or_else(|| "observer".to_string()),
        // Observers never authenticate.
        password: None,
    };

    info!("VATP observer connecting to {}", config.addr());
    let (mut session, mut events) = ObserverSession::new(config);
    session.connect().await.context("observer handshake")?;
    info!("listening for telemetry; press Ctrl-C to disconnect");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            event = events.recv() => match event {
                Some(ObserverEvent::Telemetry { snapshot, battery }) => {
                    println!("{}", render_telemetry(&snapshot, battery));
                }
                Some(ObserverEvent::Acknowledged) => {
                    info!("server acknowledgement received");
                }
                Some(ObserverEvent::ConnectionLost) => {
                    warn!("connection to the vehicle server lost");
                    break;
                }
                None => break,
            },
        }
    }

    session.disconnect().await;
    Ok(())
}

/// One telemetry line per update, `--` for fields not yet reported.
fn render_telemetry(snapshot: &TelemetrySnapshot, battery: Option<BatterySeverity>) -> String {
    let speed = snapshot
        .speed_kmh
        .map(|v| format!("{v:.1} km/h"))
        .unwrap_or_else(|| "--".to_string());
    let battery_text = match (snapshot.battery_percent, battery) {
        (Some(v), Some(BatterySeverity::Critical)) => format!("{v:.0}% [CRITICAL]"),
        (Some(v), Some(BatterySeverity::Warning)) => format!("{v:.0}% [warning]"),
        (Some(v), _) => format!("{v:.0}%"),
        (None, _) => "--".to_string(),
    };
    let temperature = snapshot
        .temperature_c
        .map(|v| format!("{v:.1} C"))
        .unwrap_or_else(|| "--".to_string());
    let direction = snapshot.direction.as_deref().unwrap_or("--");
    let moving = match snapshot.moving {
        Some(true) => "moving",
        Some(false) => "stopped",
        None => "--",
    };
    format!(
        "speed {speed} | battery {battery_text} | temp {temperature} | dir {direction} | {moving}"
    )
}
