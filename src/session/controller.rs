//! Session controller: login, registration, hydration, logout.
//!
//! ARCHITECTURE
//! ============
//! One controller instance is shared (usually behind an `Arc`) by every view
//! and guard that needs session state. Transitions are `async` and suspend
//! only at the gateway call; the state lock is never held across an await.
//!
//! FENCING
//! =======
//! Each transition takes the next value of a generation counter kept under
//! the state lock. Only the newest transition may write session state,
//! touch the persisted credential, or clear `is_loading`. A response that
//! arrives after a newer transition started is dropped on the floor.
//! Logout does its clearing at the moment it claims a generation, so it
//! never depends on winning the race after its network call.
//!
//! ERROR HANDLING
//! ==============
//! Transitions never return errors. Every gateway failure is absorbed into
//! the returned `Session`: rejected credentials become `error`, 401 during
//! hydration is an ordinary logged-out state, and logout always clears
//! local state whatever the server said.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::Method;
use serde_json::{Value, json};

use super::state::{Session, SessionPhase, UserProfile};
use crate::gateway::{Gateway, GatewayError, LOGIN_PATH, LOGOUT_PATH, ME_PATH, REGISTER_PATH};
use crate::storage::CredentialStore;

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Credential-exchange responses carry the token under either name.
const TOKEN_FIELDS: [&str; 2] = ["token", "access"];

struct Inner {
    session: Session,
    generation: u64,
    /// Generation of the `fetch_user` call in flight, if any.
    hydrating: Option<u64>,
}

enum Hydration {
    Authenticated,
    Unauthenticated,
    Failed(GatewayError),
    Stale,
}

pub struct SessionController {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn CredentialStore>,
    inner: Mutex<Inner>,
}

impl SessionController {
    /// Build an empty session and attach any persisted credential to the
    /// gateway. Call [`SessionController::restore`] to hydrate it.
    pub fn new(gateway: Arc<dyn Gateway>, store: Arc<dyn CredentialStore>) -> Self {
        let persisted = match store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "persisted credential unreadable; starting anonymous");
                None
            }
        };
        gateway.set_bearer(persisted.as_deref());

        Self {
            gateway,
            store,
            inner: Mutex::new(Inner { session: Session::default(), generation: 0, hydrating: None }),
        }
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock().session.phase()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.lock().session.user.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().session.error.clone()
    }

    /// Whether a credential is attached to outgoing requests.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.gateway.bearer().is_some()
    }

    /// Gateway carrying this session's credential, for protected consumers.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Startup hydration: fetch the profile when a credential was persisted
    /// by an earlier run and the session is not yet authenticated.
    pub async fn restore(&self) -> Session {
        if !self.has_credential() || self.is_authenticated() {
            return self.snapshot();
        }
        self.fetch_user().await
    }

    /// Exchange username/password for a token, then hydrate.
    pub async fn login(&self, username: &str, password: &str) -> Session {
        let flight = self.begin(|s| s.error = None);
        let body = json!({ "username": username, "password": password });

        match self.gateway.request(Method::POST, LOGIN_PATH, Some(body)).await {
            Ok(response) => {
                if self.adopt_grant(&flight, "login", &response.data, LOGIN_FAILED) {
                    self.complete_sign_in(&flight, LOGIN_FAILED).await;
                }
            }
            Err(err) => self.reject(&flight, "login", &err, LOGIN_FAILED),
        }
        flight.finish()
    }

    /// Create an account, then hydrate as its owner.
    ///
    /// No local validation of email or password is done. When the backend
    /// does not hand out a token on registration, the new credentials are
    /// exchanged for one before hydrating.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Session {
        let flight = self.begin(|s| s.error = None);
        let body = json!({ "username": username, "email": email, "password": password });

        let created = match self.gateway.request(Method::POST, REGISTER_PATH, Some(body)).await {
            Ok(response) => response,
            Err(err) => {
                self.reject(&flight, "register", &err, REGISTRATION_FAILED);
                return flight.finish();
            }
        };
        if !flight.is_current() {
            return flight.finish();
        }

        let grant = if granted_token(&created.data).is_some() {
            created
        } else {
            let body = json!({ "username": username, "password": password });
            match self.gateway.request(Method::POST, LOGIN_PATH, Some(body)).await {
                Ok(grant) => grant,
                Err(err) => {
                    self.reject(&flight, "register", &err, REGISTRATION_FAILED);
                    return flight.finish();
                }
            }
        };

        if self.adopt_grant(&flight, "register", &grant.data, REGISTRATION_FAILED) {
            self.complete_sign_in(&flight, REGISTRATION_FAILED).await;
        }
        flight.finish()
    }

    /// Ask the backend who the current credential belongs to.
    ///
    /// No-op once hydrated; `logout` resets the guard. A call made while
    /// another `fetch_user` is still waiting on the network returns the
    /// loading snapshot instead of issuing a second request.
    pub async fn fetch_user(&self) -> Session {
        let flight = {
            let mut inner = self.lock();
            if inner.session.loaded {
                tracing::debug!("session already hydrated");
                return inner.session.clone();
            }
            if inner.session.is_loading && inner.hydrating == Some(inner.generation) {
                tracing::debug!("hydration already in flight");
                return inner.session.clone();
            }
            let flight = self.start(&mut inner);
            inner.hydrating = Some(flight.generation);
            flight
        };
        self.hydrate(&flight).await;
        flight.finish()
    }

    /// Unconditional local clearing, then best-effort server invalidation.
    ///
    /// Local state, the persisted token and the bearer are gone before the
    /// first await, so neither a newer transition nor a dropped future can
    /// keep them alive. The invalidation request carries the token captured
    /// beforehand.
    pub async fn logout(&self) -> Session {
        let token = self.gateway.bearer();
        let flight = self.begin(|s| {
            s.deauthenticate();
            s.error = None;
            s.loaded = false;
            self.forget_credential();
        });

        if let Err(err) = self
            .gateway
            .request_with_bearer(Method::POST, LOGOUT_PATH, None, token.as_deref())
            .await
        {
            tracing::warn!(error = %err, code = err.error_code(), "logout request failed; local session already cleared");
        }
        flight.finish()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, prepare: impl FnOnce(&mut Session)) -> InFlight<'_> {
        let mut inner = self.lock();
        prepare(&mut inner.session);
        self.start(&mut inner)
    }

    /// Claim the next generation. Caller holds the lock.
    fn start(&self, inner: &mut Inner) -> InFlight<'_> {
        inner.generation += 1;
        inner.session.is_loading = true;
        InFlight { controller: self, generation: inner.generation }
    }

    fn settle(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation {
            inner.session.is_loading = false;
        }
    }

    async fn hydrate(&self, flight: &InFlight<'_>) -> Hydration {
        if !flight.is_current() {
            return Hydration::Stale;
        }

        let profile = match self.gateway.request(Method::GET, ME_PATH, None).await {
            Ok(response) => {
                serde_json::from_value::<UserProfile>(response.data).map_err(|e| GatewayError::Decode(e.to_string()))
            }
            Err(err) => Err(err),
        };

        match profile {
            Ok(user) => {
                let user_id = user.id;
                if !flight.commit(|s| s.authenticate(user)) {
                    return Hydration::Stale;
                }
                tracing::info!(user_id, "session hydrated");
                Hydration::Authenticated
            }
            Err(err) if err.is_unauthorized() => {
                tracing::debug!("no active session");
                let applied = flight.commit(|s| {
                    s.deauthenticate();
                    s.loaded = true;
                    self.forget_credential();
                });
                if applied { Hydration::Unauthenticated } else { Hydration::Stale }
            }
            Err(err) => {
                tracing::error!(error = %err, code = err.error_code(), "fetch user failed");
                if flight.commit(Session::deauthenticate) { Hydration::Failed(err) } else { Hydration::Stale }
            }
        }
    }

    /// Hydrate after a successful credential exchange; anything short of a
    /// profile turns the sign-in into a failure.
    async fn complete_sign_in(&self, flight: &InFlight<'_>, fallback: &str) {
        let message = match self.hydrate(flight).await {
            Hydration::Authenticated | Hydration::Stale => return,
            Hydration::Unauthenticated => fallback.to_owned(),
            Hydration::Failed(err) => err.server_message().unwrap_or(fallback).to_owned(),
        };
        flight.commit(|s| s.fail(message));
    }

    fn reject(&self, flight: &InFlight<'_>, action: &'static str, err: &GatewayError, fallback: &str) {
        tracing::warn!(action, error = %err, code = err.error_code(), "credential exchange failed");
        let message = err.server_message().unwrap_or(fallback).to_owned();
        flight.commit(|s| s.fail(message));
    }

    /// Persist and attach the token from a credential-exchange response.
    /// Returns false when the response carries no token (a grant without
    /// one is not a sign-in) or the transition went stale.
    fn adopt_grant(&self, flight: &InFlight<'_>, action: &'static str, data: &Value, fallback: &str) -> bool {
        let Some(token) = granted_token(data) else {
            tracing::warn!(action, "credential exchange returned no token");
            flight.commit(|s| s.fail(fallback.to_owned()));
            return false;
        };
        flight.commit(|_| {
            if let Err(e) = self.store.save(&token) {
                tracing::warn!(error = %e, "credential persist failed; session will not survive restart");
            }
            self.gateway.set_bearer(Some(&token));
        })
    }

    fn forget_credential(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "persisted credential could not be deleted");
        }
        self.gateway.set_bearer(None);
    }
}

fn granted_token(data: &Value) -> Option<String> {
    TOKEN_FIELDS
        .iter()
        .find_map(|field| data.get(field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

// =============================================================================
// IN-FLIGHT GUARD
// =============================================================================

/// Ticket for one transition. Dropping it (normally or because the caller
/// abandoned the future) clears `is_loading` if no newer transition began.
struct InFlight<'a> {
    controller: &'a SessionController,
    generation: u64,
}

impl InFlight<'_> {
    fn is_current(&self) -> bool {
        self.controller.lock().generation == self.generation
    }

    /// Apply `f` under the state lock if this transition is still the
    /// newest. Returns whether it ran.
    fn commit(&self, f: impl FnOnce(&mut Session)) -> bool {
        let mut inner = self.controller.lock();
        if inner.generation != self.generation {
            tracing::debug!(generation = self.generation, "stale transition result discarded");
            return false;
        }
        f(&mut inner.session);
        true
    }

    fn finish(self) -> Session {
        let controller = self.controller;
        drop(self);
        controller.snapshot()
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.controller.settle(self.generation);
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
