//! Route guard: decides whether a view may render for the current session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Reads `is_loading`, `is_authenticated` and `user` from a session snapshot
//! and nothing else. It never calls controller mutators; redirects are the
//! only way it influences the session, by steering the user to a form.

use crate::session::Session;

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Anyone may view.
    Public,
    /// Requires an authenticated session with a loaded profile.
    Protected,
    /// Login/register forms; authenticated users are sent home.
    GuestOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteRule {
    pub path: &'static str,
    pub access: Access,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
    /// A transition is in flight; render a placeholder and check again.
    Pending,
}

#[derive(Clone, Debug)]
pub struct RouteGuard {
    rules: Vec<RouteRule>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(vec![
            RouteRule { path: "/", access: Access::Public },
            RouteRule { path: "/login", access: Access::GuestOnly },
            RouteRule { path: "/register", access: Access::GuestOnly },
            RouteRule { path: "/map", access: Access::Protected },
            RouteRule { path: "/list", access: Access::Protected },
        ])
    }
}

impl RouteGuard {
    #[must_use]
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Access level for `path`. Unmatched paths are public; they resolve to
    /// the not-found view.
    #[must_use]
    pub fn access(&self, path: &str) -> Access {
        let path = normalize(path);
        self.rules
            .iter()
            .find(|rule| normalize(rule.path) == path)
            .map_or(Access::Public, |rule| rule.access)
    }

    #[must_use]
    pub fn check(&self, session: &Session, path: &str) -> GuardDecision {
        match self.access(path) {
            Access::Public => GuardDecision::Allow,
            Access::Protected if session.is_loading => GuardDecision::Pending,
            Access::Protected if signed_in(session) => GuardDecision::Allow,
            Access::Protected => GuardDecision::Redirect(LOGIN_ROUTE),
            Access::GuestOnly if signed_in(session) => GuardDecision::Redirect(HOME_ROUTE),
            Access::GuestOnly => GuardDecision::Allow,
        }
    }
}

fn signed_in(session: &Session) -> bool {
    session.is_authenticated && session.user.is_some()
}

/// Strip query and fragment, drop trailing slashes (root stays `/`).
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
