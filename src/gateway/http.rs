//! `reqwest`-backed gateway. Thin HTTP wrapper; body decoding lives in
//! `decode_body` for testability.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use super::Gateway;
use super::types::{GatewayError, GatewayResponse};
use crate::config::{ClientConfig, GatewayTimeouts};

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    bearer: RwLock<Option<String>>,
}

impl HttpGateway {
    /// Build a gateway for `base_url` (no trailing slash expected).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>, timeouts: GatewayTimeouts) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| GatewayError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url, bearer: RwLock::new(None) })
    }

    /// Build a gateway from parsed client config.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, GatewayError> {
        Self::new(config.base_url.clone(), config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn request_with_bearer(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<GatewayResponse, GatewayError> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(json) = body {
            request = request.json(&json);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let data = decode_body(&text);

        tracing::debug!(%method, path, status = status.as_u16(), "gateway response");

        if !status.is_success() {
            return Err(GatewayError::Status { status: status.as_u16(), body: data });
        }
        Ok(GatewayResponse::new(status.as_u16(), data))
    }

    fn set_bearer(&self, token: Option<&str>) {
        let mut slot = self.bearer.write().unwrap_or_else(PoisonError::into_inner);
        *slot = token.map(str::to_owned);
    }

    fn bearer(&self) -> Option<String> {
        self.bearer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}/{path}")
    }
}

/// Empty bodies become `null`, non-JSON bodies a JSON string.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
