//! Session snapshot and user profile types.
//!
//! DESIGN
//! ======
//! `Session` is plain data handed out by value. Views and the route guard
//! read snapshots; only the controller writes the live copy.

use serde::{Deserialize, Serialize};

/// Preference tag attached to a profile (favorite genre, tonight's mood).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Current user as returned by the "who am I" endpoint.
///
/// Opaque to the controller beyond its shape: stored as received, never
/// validated. Everything but `id` and `username` may be absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub favorite_genres: Vec<Tag>,
    #[serde(default)]
    pub mood_for_tonight: Option<Tag>,
}

impl UserProfile {
    /// Nickname when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Coarse state-machine position derived from a [`Session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
    /// Last transition failed; the session is otherwise anonymous.
    Error,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Client-held record of who is logged in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    /// True only while a transition is in flight.
    pub is_loading: bool,
    /// Display message from the last failed login/register.
    pub error: Option<String>,
    /// Hydration guard: the "who am I" question has a definitive answer.
    pub loaded: bool,
}

impl Session {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Authenticating
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else if self.error.is_some() {
            SessionPhase::Error
        } else {
            SessionPhase::Anonymous
        }
    }

    pub(crate) fn authenticate(&mut self, user: UserProfile) {
        self.user = Some(user);
        self.is_authenticated = true;
        self.error = None;
        self.loaded = true;
    }

    pub(crate) fn deauthenticate(&mut self) {
        self.user = None;
        self.is_authenticated = false;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.deauthenticate();
        self.error = Some(message);
        self.loaded = false;
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
