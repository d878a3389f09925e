//! Activity listing: venues and events shown in the list and map views.
//!
//! SYSTEM CONTEXT
//! ==============
//! First protected consumer of the session: listing requires an
//! authenticated session, and filtering is a linear scan over what was
//! already fetched.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::gateway::GatewayError;
use crate::session::SessionController;

pub const ACTIVITIES_PATH: &str = "/api/activities/";

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("activity list decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One venue or event as listed by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub live: bool,
    pub broadcasted_live: Option<String>,
    pub event: Option<String>,
    pub mood: Option<String>,
    pub type_name: Option<String>,
    pub type_color: Option<String>,
    pub genre_name: Option<String>,
    pub event_type_name: Option<String>,
    pub price_category_name: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub music: Option<String>,
}

impl Activity {
    /// Map placement, when both coordinates are present.
    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Search box plus event-type chip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub query: Option<String>,
    pub event_type: Option<String>,
}

impl ActivityFilter {
    #[must_use]
    pub fn matches(&self, activity: &Activity) -> bool {
        if let Some(query) = non_blank(self.query.as_deref()) {
            let hit = [&activity.name, &activity.event_type_name, &activity.music]
                .into_iter()
                .any(|field| contains_ignore_case(field.as_deref(), query));
            if !hit {
                return false;
            }
        }
        match non_blank(self.event_type.as_deref()) {
            Some(kind) => contains_ignore_case(activity.event_type_name.as_deref(), kind),
            None => true,
        }
    }

    /// Matching activities, in listing order.
    #[must_use]
    pub fn apply<'a>(&self, activities: &'a [Activity]) -> Vec<&'a Activity> {
        activities.iter().filter(|a| self.matches(a)).collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// Fetch the activity list with the session's credential.
///
/// # Errors
///
/// Returns [`ActivityError::NotAuthenticated`] before any network call when
/// the session is not signed in, otherwise gateway and decode failures.
pub async fn fetch_activities(session: &SessionController) -> Result<Vec<Activity>, ActivityError> {
    if !session.is_authenticated() {
        return Err(ActivityError::NotAuthenticated);
    }
    let response = session
        .gateway()
        .request(Method::GET, ACTIVITIES_PATH, None)
        .await?;
    let activities: Vec<Activity> = serde_json::from_value(response.data)?;
    tracing::debug!(count = activities.len(), "activities loaded");
    Ok(activities)
}

#[cfg(test)]
#[path = "activities_test.rs"]
mod tests;
