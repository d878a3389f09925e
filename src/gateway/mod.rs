//! HTTP gateway: the request/response seam between the session controller
//! and the Out2Nite backend.
//!
//! DESIGN
//! ======
//! The controller only sees the [`Gateway`] trait: one generic `request`
//! call plus the bearer header that rides along with every call. That keeps
//! the state machine testable with a scripted mock and leaves transport
//! concerns (timeouts, URL joining, body decoding) in [`HttpGateway`].
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx statuses surface as [`GatewayError::Status`] carrying the decoded
//! body, so callers can tell "credentials rejected" apart from "server
//! unreachable" and pull the backend's display message out unchanged.

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use http::HttpGateway;
pub use types::{GatewayError, GatewayResponse};

use reqwest::Method;
use serde_json::Value;

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const REGISTER_PATH: &str = "/api/auth/register/";
pub const ME_PATH: &str = "/api/auth/me/";
pub const LOGOUT_PATH: &str = "/api/auth/logout/";

/// Backend request seam. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Issue `method path` with an optional JSON body.
    ///
    /// The current bearer token, if any, is attached as the
    /// `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on transport failure or a non-2xx status.
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<GatewayResponse, GatewayError> {
        let bearer = self.bearer();
        self.request_with_bearer(method, path, body, bearer.as_deref()).await
    }

    /// Issue a request authorized by `bearer` instead of the attached token.
    ///
    /// Logout uses this to invalidate a token that has already been
    /// detached locally.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::request`].
    async fn request_with_bearer(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<GatewayResponse, GatewayError>;

    /// Attach (`Some`) or detach (`None`) the bearer token used by
    /// subsequent requests.
    fn set_bearer(&self, token: Option<&str>);

    /// Token currently attached to outgoing requests.
    fn bearer(&self) -> Option<String>;
}
