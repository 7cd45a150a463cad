//! VATP admin console entry point.
//!
//! Connects to the vehicle server as ADMIN, authenticates, and turns console
//! input into COMMAND frames. Server responses print verbatim.
//!
//! ```text
//! vatp-admin [OPTIONS] [COMMANDS]...
//!
//! Options:
//!   --host <HOST>          Server hostname or IP [default: 127.0.0.1]
//!   --port <PORT>          Server TCP port [default: 8080]
//!   --username <NAME>      Username for CONNECT/AUTH [default: admin]
//!   --password <PASSWORD>  Password for CONNECT/AUTH [default: admin123]
//!   --config <FILE>        Optional TOML config file
//! ```
//!
//! With positional COMMANDS the console sends them in order and exits;
//! without, it reads commands interactively. `telemetry` requests a one-shot
//! telemetry report, `users` lists connected users, `quit` (or Ctrl-C)
//! disconnects.
//!
//! CLI flags take precedence over the config file, which takes precedence
//! over the built-in defaults. Flags also read the environment variables
//! `VATP_HOST`, `VATP_PORT`, `VATP_USERNAME`, `VATP_PASSWORD`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vatp_client::config::{ConfigFile, SessionConfig, DEFAULT_HOST, DEFAULT_PORT};
use vatp_client::AdminSession;
use vatp_core::VehicleCommand;

/// VATP admin console for the autonomous-vehicle server.
#[derive(Debug, Parser)]
#[command(
    name = "vatp-admin",
    about = "Issue authenticated control commands to the vehicle server",
    version
)]
struct Cli {
    /// Server hostname or IP address.
    #[arg(long, env = "VATP_HOST")]
    host: Option<String>,

    /// Server TCP port.
    #[arg(long, env = "VATP_PORT")]
    port: Option<u16>,

    /// Username for the CONNECT/AUTH exchange.
    #[arg(long, env = "VATP_USERNAME")]
    username: Option<String>,

    /// Password for the CONNECT/AUTH exchange.
    #[arg(long, env = "VATP_PASSWORD")]
    password: Option<String>,

    /// Optional TOML config file with host/port/credential overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Commands to send in order before exiting. Without any, the console
    /// reads commands interactively.
    commands: Vec<String>,
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
            .unwrap_or_else(|| "admin".to_string()),
        password: cli
            .password
            .or(file.password)
            .or_else(|| Some("admin123".to_string())),
    };

    info!("VATP admin console connecting to {}", config.addr());
    let mut session = AdminSession::new(config);
    session
        .connect()
        .await
        .context("connect and authenticate")?;
    info!(
        "authenticated; active token: {}",
        session.auth_token().unwrap_or("-")
    );

    if cli.commands.is_empty() {
        run_interactive(&mut session).await;
    } else {
        for command in &cli.commands {
            if let Err(e) = run_line(&mut session, command).await {
                warn!("{command}: {e}");
                break;
            }
        }
    }

    session.disconnect().await;
    Ok(())
}

/// Reads commands from stdin until `quit`, end of input, or Ctrl-C.
async fn run_interactive(session: &mut AdminSession) {
    println!("commands: SPEED_UP, SLOW_DOWN, TURN_LEFT, TURN_RIGHT, telemetry, users, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("console input failed: {e}");
                    break;
                }
            },
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if let Err(e) = run_line(session, line).await {
            warn!("{line}: {e}");
            break;
        }
    }
}

/// Dispatches one console line and prints the server response.
async fn run_line(
    session: &mut AdminSession,
    line: &str,
) -> Result<(), vatp_client::SessionError> {
    let response = if line.eq_ignore_ascii_case("telemetry") {
        session.request_telemetry().await?
    } else if line.eq_ignore_ascii_case("users") {
        session.list_users().await?
    } else {
        // Known commands are normalized to their canonical spelling; anything
        // else passes through uninterpreted – the server is authoritative.
        match VehicleCommand::parse(line) {
            Some(command) => session.send_command(command.wire_name()).await?,
            None => session.send_command(line).await?,
        }
    };
    println!("{}", response.text());
    Ok(())
}
