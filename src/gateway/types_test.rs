use super::*;
use serde_json::json;

fn status(status: u16, body: Value) -> GatewayError {
    GatewayError::Status { status, body }
}

// =============================================================================
// server_message
// =============================================================================

#[test]
fn server_message_reads_message_field() {
    let err = status(400, json!({ "message": "Invalid credentials" }));
    assert_eq!(err.server_message(), Some("Invalid credentials"));
}

#[test]
fn server_message_ignores_other_fields() {
    let err = status(400, json!({ "detail": "No active account found" }));
    assert_eq!(err.server_message(), None);
}

#[test]
fn server_message_ignores_blank_and_non_string() {
    assert_eq!(status(400, json!({ "message": "   " })).server_message(), None);
    assert_eq!(status(400, json!({ "message": ["a", "b"] })).server_message(), None);
    assert_eq!(status(500, Value::Null).server_message(), None);
}

#[test]
fn server_message_absent_for_transport() {
    assert_eq!(GatewayError::Transport("timed out".into()).server_message(), None);
}

// =============================================================================
// classification
// =============================================================================

#[test]
fn unauthorized_only_for_401() {
    assert!(status(401, Value::Null).is_unauthorized());
    assert!(!status(403, Value::Null).is_unauthorized());
    assert!(!GatewayError::Transport("x".into()).is_unauthorized());
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(status(401, Value::Null).error_code(), "E_UNAUTHORIZED");
    assert_eq!(status(400, Value::Null).error_code(), "E_REJECTED");
    assert_eq!(status(503, Value::Null).error_code(), "E_SERVER");
    assert_eq!(GatewayError::Transport("x".into()).error_code(), "E_TRANSPORT");
    assert_eq!(GatewayError::Decode("x".into()).error_code(), "E_DECODE");
    assert_eq!(GatewayError::HttpClientBuild("x".into()).error_code(), "E_HTTP_CLIENT_BUILD");
}

#[test]
fn retryable_for_transport_throttle_and_5xx() {
    assert!(GatewayError::Transport("reset".into()).retryable());
    assert!(status(429, Value::Null).retryable());
    assert!(status(502, Value::Null).retryable());
    assert!(!status(400, Value::Null).retryable());
    assert!(!status(401, Value::Null).retryable());
    assert!(!GatewayError::Decode("x".into()).retryable());
}

#[test]
fn status_display_includes_code() {
    assert_eq!(status(404, Value::Null).to_string(), "server returned HTTP 404");
}
