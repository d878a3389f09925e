//! Gateway response and error types.

use serde_json::Value;

/// Successful (2xx) response from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    /// Decoded body: JSON when possible, a JSON string for plain text,
    /// `null` when empty.
    pub data: Value,
}

impl GatewayResponse {
    #[must_use]
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The backend answered with a non-success HTTP status.
    #[error("server returned HTTP {status}")]
    Status { status: u16, body: Value },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(String),

    /// A 2xx body could not be decoded into the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl GatewayError {
    /// HTTP status for [`GatewayError::Status`], `None` otherwise.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Expired or missing session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Display message supplied by the backend in the error body's
    /// `message` field. Treated as opaque text.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => body
                .get("message")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Status { status: 401, .. } => "E_UNAUTHORIZED",
            Self::Status { status: 400..=499, .. } => "E_REJECTED",
            Self::Status { .. } => "E_SERVER",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Decode(_) => "E_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
