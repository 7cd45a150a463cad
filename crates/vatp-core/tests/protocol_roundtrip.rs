//! Integration tests for the vatp-core protocol codec.
//!
//! These tests verify complete round-trip encoding and decoding of every
//! client request through the public API, plus decoding of the response and
//! telemetry blocks the reference server produces.

use vatp_core::protocol::messages::{headers, markers};
use vatp_core::{decode_block, encode, Method, Role, TelemetrySnapshot, VatpMessage};

/// Encodes a message, splits it back into wire lines, and decodes it,
/// asserting the decoded message compares equal to the original.
fn roundtrip(msg: VatpMessage) -> VatpMessage {
    let encoded = encode(&msg);
    assert!(
        encoded.ends_with("\r\n\r\n"),
        "every encoded message must end with the blank-line terminator"
    );
    let decoded = decode_block(encoded.split("\r\n")).expect("decode must succeed");
    assert_eq!(decoded, msg);
    decoded
}

#[test]
fn test_roundtrip_admin_connect() {
    let msg = VatpMessage::request(Method::Connect)
        .with_header(headers::USER_TYPE, Role::Admin.wire_name())
        .with_header(headers::USERNAME, "admin")
        .with_header(headers::PASSWORD, "admin123");

    let decoded = roundtrip(msg);

    assert_eq!(decoded.header(headers::USER_TYPE), Some("ADMIN"));
}

#[test]
fn test_roundtrip_observer_connect() {
    let msg = VatpMessage::request(Method::Connect)
        .with_header(headers::USER_TYPE, Role::Observer.wire_name())
        .with_header(headers::USERNAME, "observer");

    roundtrip(msg);
}

#[test]
fn test_roundtrip_auth() {
    let msg = VatpMessage::request(Method::Auth)
        .with_header(headers::USERNAME, "admin")
        .with_header(headers::PASSWORD, "admin123");

    roundtrip(msg);
}

#[test]
fn test_roundtrip_command_preserves_header_order() {
    let msg = VatpMessage::request(Method::Command)
        .with_header(headers::USERNAME, "admin")
        .with_header(headers::AUTH_TOKEN, "TOKEN_1722_42")
        .with_header(headers::COMMAND, "SPEED_UP");

    let decoded = roundtrip(msg);

    let names: Vec<&str> = decoded.headers().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["Username", "Auth-Token", "Command"]);
}

#[test]
fn test_roundtrip_get_telemetry_and_list_users() {
    for method in [Method::GetTelemetry, Method::ListUsers] {
        let msg = VatpMessage::request(method)
            .with_header(headers::USERNAME, "admin")
            .with_header(headers::AUTH_TOKEN, "TOKEN_1");
        roundtrip(msg);
    }
}

#[test]
fn test_roundtrip_disconnect() {
    let msg = VatpMessage::request(Method::Disconnect).with_header(headers::USERNAME, "observer");

    roundtrip(msg);
}

#[test]
fn test_server_telemetry_block_decodes_and_classifies() {
    // A telemetry push exactly as the reference server frames it.
    let wire = "VATP/1.0 TELEMETRY_DATA 94\r\n\
                Speed: 42.00 km/h\r\n\
                Battery: 15.00%\r\n\
                Temperature: 23.50 C\r\n\
                Direction: North\r\n\
                Moving: Yes\r\n\
                \r\n";

    let block = decode_block(wire.split("\r\n")).expect("telemetry block decodes");
    assert!(block.contains(markers::TELEMETRY_DATA));

    let mut snapshot = TelemetrySnapshot::default();
    snapshot.apply(&block);

    assert_eq!(snapshot.speed_kmh, Some(42.0));
    assert_eq!(snapshot.battery_percent, Some(15.0));
    assert_eq!(snapshot.temperature_c, Some(23.5));
    assert_eq!(snapshot.direction.as_deref(), Some("North"));
    assert_eq!(snapshot.moving, Some(true));
}

#[test]
fn test_server_ack_with_free_form_text_exposes_marker_and_token() {
    // The server embeds the token in free-form response text, not a header.
    let wire = "VATP/1.0 RESPONSE_OK 40\r\n\
                Authentication succeeded. Token: TOKEN_1722_42\r\n\
                \r\n";

    let block = decode_block(wire.split("\r\n")).expect("ack decodes");

    assert!(block.contains(markers::RESPONSE_OK));
    assert_eq!(block.auth_token(), Some("TOKEN_1722_42".to_string()));
}

#[test]
fn test_unknown_server_message_decodes_without_error() {
    // Forward compatibility: an unrecognized method still yields a block.
    let block = decode_block(["VATP/1.0 VEHICLE_STATUS 0", "Mode: autonomous", ""])
        .expect("unknown block decodes");

    assert_eq!(block.method, Method::Other("VEHICLE_STATUS".to_string()));
    assert_eq!(block.header("Mode"), Some("autonomous"));
    assert!(!block.contains(markers::TELEMETRY_DATA));
}
