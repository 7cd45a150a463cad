//! All VATP/1.0 message types.
//!
//! VATP is a line-oriented text protocol. A message is a start line of the
//! form `VATP/1.0 <METHOD> <seq>` followed by `Name: Value` header lines and
//! terminated by exactly one blank line. There is no body beyond headers.
//!
//! The server does not guarantee strict framing on every path, so inbound
//! messages keep their raw decoded lines alongside the parsed headers. Marker
//! detection ([`VatpMessage::contains`]) and token discovery
//! ([`VatpMessage::auth_token`]) scan those raw lines by substring rather than
//! relying on structured fields.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Protocol version token carried on every start line.
pub const PROTOCOL_VERSION: &str = "VATP/1.0";

/// Header names used by the client methods and the telemetry stream.
pub mod headers {
    pub const USER_TYPE: &str = "User-Type";
    pub const USERNAME: &str = "Username";
    pub const PASSWORD: &str = "Password";
    pub const AUTH_TOKEN: &str = "Auth-Token";
    pub const COMMAND: &str = "Command";

    pub const SPEED: &str = "Speed";
    pub const BATTERY: &str = "Battery";
    pub const TEMPERATURE: &str = "Temperature";
    pub const DIRECTION: &str = "Direction";
    pub const MOVING: &str = "Moving";
}

/// Substring markers scanned for in inbound blocks.
pub mod markers {
    /// Tags a server-pushed telemetry block.
    pub const TELEMETRY_DATA: &str = "TELEMETRY_DATA";
    /// Tags a positive server acknowledgement.
    pub const RESPONSE_OK: &str = "RESPONSE_OK";
    /// Tags a server error report.
    pub const RESPONSE_ERROR: &str = "RESPONSE_ERROR";
    /// Prefix of the session token issued during AUTH.
    pub const TOKEN_PREFIX: &str = "TOKEN_";
}

// ── Method ────────────────────────────────────────────────────────────────────

/// Method token of the start line.
///
/// Client requests use the first six variants; the response variants appear
/// only on inbound messages. `Other` absorbs unrecognized tokens and blocks
/// whose start line is missing entirely (tolerant decoding keeps those blocks
/// available for marker scanning instead of rejecting them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Connect,
    Auth,
    GetTelemetry,
    Command,
    ListUsers,
    Disconnect,
    ResponseOk,
    ResponseError,
    TelemetryData,
    Other(String),
}

impl Method {
    /// Wire spelling of this method.
    pub fn wire_name(&self) -> &str {
        match self {
            Method::Connect => "CONNECT",
            Method::Auth => "AUTH",
            Method::GetTelemetry => "GET_TELEMETRY",
            Method::Command => "COMMAND",
            Method::ListUsers => "LIST_USERS",
            Method::Disconnect => "DISCONNECT",
            Method::ResponseOk => "RESPONSE_OK",
            Method::ResponseError => "RESPONSE_ERROR",
            Method::TelemetryData => "TELEMETRY_DATA",
            Method::Other(token) => token,
        }
    }

    /// Parses a start-line token. Unknown tokens become [`Method::Other`].
    pub fn from_wire(token: &str) -> Method {
        match token {
            "CONNECT" => Method::Connect,
            "AUTH" => Method::Auth,
            "GET_TELEMETRY" => Method::GetTelemetry,
            "COMMAND" => Method::Command,
            "LIST_USERS" => Method::ListUsers,
            "DISCONNECT" => Method::Disconnect,
            "RESPONSE_OK" => Method::ResponseOk,
            "RESPONSE_ERROR" => Method::ResponseError,
            "TELEMETRY_DATA" => Method::TelemetryData,
            other => Method::Other(other.to_string()),
        }
    }
}

// ── Message ───────────────────────────────────────────────────────────────────

/// One framed VATP message.
///
/// Built locally for outgoing requests (via [`VatpMessage::request`] and
/// [`VatpMessage::with_header`]) or produced by the block decoder for inbound
/// traffic. Header order is preserved as inserted/received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatpMessage {
    /// Start-line method.
    pub method: Method,
    /// Start-line sequence number. Always 0 in this protocol version; the
    /// field is reserved for future request/response correlation.
    pub sequence: u32,
    headers: Vec<(String, String)>,
    /// Raw lines of the decoded block, without line terminators. Empty for
    /// locally built messages.
    raw: Vec<String>,
}

impl VatpMessage {
    /// Starts a new outgoing request with sequence number 0.
    pub fn request(method: Method) -> VatpMessage {
        VatpMessage {
            method,
            sequence: 0,
            headers: Vec::new(),
            raw: Vec::new(),
        }
    }

    /// Creates a decoded message. Used by the codec; callers build requests
    /// through [`VatpMessage::request`].
    pub(crate) fn decoded(
        method: Method,
        sequence: u32,
        headers: Vec<(String, String)>,
        raw: Vec<String>,
    ) -> VatpMessage {
        VatpMessage {
            method,
            sequence,
            headers,
            raw,
        }
    }

    /// Appends a header, preserving insertion order.
    pub fn with_header(mut self, name: &str, value: &str) -> VatpMessage {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Headers in wire order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Value of the first header named `name`, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// True when any line of the message contains `needle`.
    ///
    /// Decoded messages scan their raw lines, so a marker is found no matter
    /// where the server placed it. Locally built messages scan the method
    /// token and headers.
    pub fn contains(&self, needle: &str) -> bool {
        if !self.raw.is_empty() {
            return self.raw.iter().any(|line| line.contains(needle));
        }
        self.method.wire_name().contains(needle)
            || self
                .headers
                .iter()
                .any(|(n, v)| n.contains(needle) || v.contains(needle))
    }

    /// Searches the message for a session token.
    ///
    /// Any substring beginning `TOKEN_` counts; the token runs from the
    /// prefix to the end of its line, trimmed. The server embeds the token in
    /// free-form response text, so this is a substring scan by contract.
    pub fn auth_token(&self) -> Option<String> {
        let scan_line = |line: &str| {
            line.find(markers::TOKEN_PREFIX)
                .map(|idx| line[idx..].trim().to_string())
        };
        if !self.raw.is_empty() {
            return self.raw.iter().find_map(|line| scan_line(line));
        }
        self.headers.iter().find_map(|(_, v)| scan_line(v))
    }

    /// The message as display text: raw lines for decoded messages, the
    /// rendered start line and headers otherwise.
    pub fn text(&self) -> String {
        if !self.raw.is_empty() {
            return self.raw.join("\n");
        }
        let mut out = format!(
            "{} {} {}",
            PROTOCOL_VERSION,
            self.method.wire_name(),
            self.sequence
        );
        for (name, value) in &self.headers {
            out.push('\n');
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
        }
        out
    }
}

// Raw lines are a decode artifact, not part of message identity: a built
// request and its decoded image must compare equal.
impl PartialEq for VatpMessage {
    fn eq(&self, other: &VatpMessage) -> bool {
        self.method == other.method
            && self.sequence == other.sequence
            && self.headers == other.headers
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_wire_name_round_trips_for_known_methods() {
        let methods = [
            Method::Connect,
            Method::Auth,
            Method::GetTelemetry,
            Method::Command,
            Method::ListUsers,
            Method::Disconnect,
            Method::ResponseOk,
            Method::ResponseError,
            Method::TelemetryData,
        ];
        for method in methods {
            assert_eq!(Method::from_wire(method.wire_name()), method);
        }
    }

    #[test]
    fn test_unknown_method_token_becomes_other() {
        // Arrange / Act
        let method = Method::from_wire("PING");

        // Assert
        assert_eq!(method, Method::Other("PING".to_string()));
        assert_eq!(method.wire_name(), "PING");
    }

    #[test]
    fn test_with_header_preserves_insertion_order() {
        let msg = VatpMessage::request(Method::Command)
            .with_header(headers::USERNAME, "admin")
            .with_header(headers::AUTH_TOKEN, "TOKEN_1")
            .with_header(headers::COMMAND, "SPEED_UP");

        let names: Vec<&str> = msg.headers().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Username", "Auth-Token", "Command"]);
    }

    #[test]
    fn test_header_lookup_returns_first_match() {
        let msg = VatpMessage::request(Method::Connect)
            .with_header(headers::USERNAME, "admin")
            .with_header(headers::USERNAME, "shadow");

        assert_eq!(msg.header(headers::USERNAME), Some("admin"));
        assert_eq!(msg.header(headers::PASSWORD), None);
    }

    #[test]
    fn test_contains_scans_headers_of_built_message() {
        let msg = VatpMessage::request(Method::Connect).with_header(headers::USER_TYPE, "ADMIN");

        assert!(msg.contains("ADMIN"));
        assert!(msg.contains("CONNECT"));
        assert!(!msg.contains("OBSERVER"));
    }

    #[test]
    fn test_auth_token_found_mid_line_runs_to_end_of_line() {
        // Token embedded in free-form response text, as the server sends it.
        let msg = VatpMessage::decoded(
            Method::ResponseOk,
            0,
            vec![],
            vec![
                "VATP/1.0 RESPONSE_OK 0".to_string(),
                "Authentication succeeded. Token: TOKEN_ABC123 ".to_string(),
            ],
        );

        assert_eq!(msg.auth_token(), Some("TOKEN_ABC123".to_string()));
    }

    #[test]
    fn test_auth_token_absent_returns_none() {
        let msg = VatpMessage::decoded(
            Method::ResponseError,
            0,
            vec![],
            vec!["VATP/1.0 RESPONSE_ERROR 0".to_string()],
        );

        assert_eq!(msg.auth_token(), None);
    }

    #[test]
    fn test_auth_token_scans_header_values_of_built_message() {
        let msg = VatpMessage::request(Method::Command).with_header(headers::AUTH_TOKEN, "TOKEN_9");

        assert_eq!(msg.auth_token(), Some("TOKEN_9".to_string()));
    }

    #[test]
    fn test_equality_ignores_raw_lines() {
        let built = VatpMessage::request(Method::Auth).with_header(headers::USERNAME, "admin");
        let decoded = VatpMessage::decoded(
            Method::Auth,
            0,
            vec![("Username".to_string(), "admin".to_string())],
            vec![
                "VATP/1.0 AUTH 0".to_string(),
                "Username: admin".to_string(),
            ],
        );

        assert_eq!(built, decoded);
    }

    #[test]
    fn test_text_of_decoded_message_is_raw_block() {
        let msg = VatpMessage::decoded(
            Method::ResponseOk,
            0,
            vec![],
            vec!["VATP/1.0 RESPONSE_OK 0".to_string(), "done".to_string()],
        );

        assert_eq!(msg.text(), "VATP/1.0 RESPONSE_OK 0\ndone");
    }
}
