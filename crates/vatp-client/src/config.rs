//! Session configuration and the optional TOML config file.
//!
//! Host and port are injected at session construction – nothing in the core
//! compiles an address in. The binaries resolve a [`SessionConfig`] from CLI
//! flags, an optional config file, and built-in defaults, in that precedence
//! order.
//!
//! Example config file:
//!
//! ```toml
//! host = "192.168.1.40"
//! port = 8080
//! username = "admin"
//! password = "admin123"
//! ```
//!
//! Every field is optional; absent fields fall through to the next source.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default server address of the reference deployment.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Error type for config file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Fully resolved settings a session is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Server hostname or IP address.
    pub host: String,
    /// Server TCP port.
    pub port: u16,
    /// Username sent on every request that carries one.
    pub username: String,
    /// Password for the CONNECT/AUTH exchange. `None` for observers.
    pub password: Option<String>,
}

impl SessionConfig {
    /// `host:port` form, for logging.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Optional overrides loaded from a TOML file. Every field is optional so a
/// partial file composes with CLI flags and defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ConfigFile {
    /// Loads overrides from `path`. An explicitly named file must exist and
    /// parse; there is no silent fallback.
    pub fn load(path: &Path) -> Result<ConfigFile, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_addr_joins_host_and_port() {
        // Arrange
        let cfg = SessionConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            username: "observer".to_string(),
            password: None,
        };

        // Act / Assert
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_config_file_parses_full_document() {
        let toml_str = r#"
host = "10.0.0.5"
port = 9090
username = "ops"
password = "secret"
"#;

        let file: ConfigFile = toml::from_str(toml_str).expect("parse");

        assert_eq!(file.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(file.port, Some(9090));
        assert_eq!(file.username.as_deref(), Some("ops"));
        assert_eq!(file.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_config_file_partial_document_leaves_rest_unset() {
        let file: ConfigFile = toml::from_str("port = 9090\n").expect("parse");

        assert_eq!(file.port, Some(9090));
        assert_eq!(file.host, None);
        assert_eq!(file.username, None);
        assert_eq!(file.password, None);
    }

    #[test]
    fn test_config_file_invalid_toml_is_parse_error() {
        let result: Result<ConfigFile, toml::de::Error> = toml::from_str("[[[ not toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = ConfigFile::load(Path::new("/nonexistent/vatp/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
