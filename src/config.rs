//! Client configuration parsed from environment variables.
//!
//! Every value has a default except the credential path, which falls back to
//! the platform data directory and fails only when the platform has none.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const CREDENTIAL_FILENAME: &str = "credential.json";

const APP_DIR: &str = "out2nite";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("no data directory available; set OUT2NITE_CREDENTIAL_PATH")]
    NoDataDir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Values that win over the environment, e.g. command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub credential_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API origin without a trailing slash, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// File holding the persisted bearer token.
    pub credential_path: PathBuf,
    pub timeouts: GatewayTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `OUT2NITE_API_URL`: default `http://localhost:8000`
    /// - `OUT2NITE_CREDENTIAL_PATH`: default `<data dir>/out2nite/credential.json`
    /// - `OUT2NITE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `OUT2NITE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse as an http(s) URL, or
    /// if no credential path is set and the platform has no data directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(ConfigOverrides::default())
    }

    /// [`ClientConfig::from_env`] with `overrides` taking precedence.
    ///
    /// The platform data directory is only consulted when neither the
    /// override nor the environment names a credential path.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_env_with(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::from_vars_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Same as [`ClientConfig::from_env`] but reading through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_vars_with(lookup, ConfigOverrides::default())
    }

    /// [`ClientConfig::from_vars`] with `overrides` taking precedence.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_vars_with<F>(lookup: F, overrides: ConfigOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = overrides
            .api_url
            .or_else(|| lookup("OUT2NITE_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let base_url = normalize_base_url(&raw_url)?;

        let credential_path = resolve_credential_path(
            overrides.credential_path,
            lookup("OUT2NITE_CREDENTIAL_PATH"),
            dirs::data_local_dir,
        )?;

        let timeouts = GatewayTimeouts {
            request_secs: parse_u64(lookup("OUT2NITE_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("OUT2NITE_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, credential_path, timeouts })
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidBaseUrl { url: raw.to_owned(), reason };

    let url = reqwest::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_owned()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Override, then environment, then `<data dir>/out2nite/credential.json`.
/// `data_dir` runs only when the first two are absent.
fn resolve_credential_path(
    override_path: Option<PathBuf>,
    env_path: Option<String>,
    data_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = override_path.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = env_path.filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let dir = data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(dir.join(APP_DIR).join(CREDENTIAL_FILENAME))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
