//! Page orchestrators
//!
//! Each page checks the authenticated flag first, reads what it can from the
//! session store and only then goes to the network. Pages render as plain
//! text through `Display`.

pub mod courses;
pub mod dashboard;
pub mod timetable;

pub use courses::{CoursesView, Selection};
pub use dashboard::{AttendanceBand, DashboardPage};
pub use timetable::{group_by_day, TimetablePage};

use crate::store::{SessionStore, SnapshotStore, StoreError};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Timetable,
    Courses,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Timetable => "/timetable",
            Route::Courses => "/courses",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Result of opening a page.
#[derive(Debug)]
pub enum Mounted<T> {
    Redirect(Route),
    Ready(T),
    /// Inline error shown in place of the page.
    Failed(String),
}

impl<T> Mounted<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Mounted::Ready(page) => Some(page),
            _ => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Mounted::Redirect(_))
    }
}

/// `Some(Route::Login)` unless the session is authenticated.
pub fn require_auth(store: &dyn SessionStore) -> Option<Route> {
    if store.is_authenticated() {
        None
    } else {
        Some(Route::Login)
    }
}

/// Forgets the whole session.
pub fn logout(store: &dyn SessionStore) -> Result<Route, StoreError> {
    store.clear_all()?;
    info!("session cleared");
    Ok(Route::Login)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SessionToken;
    use crate::store::{MemoryStore, StoreKey};
    use serde_json::json;

    #[test]
    fn test_logout_clears_store() {
        let store = MemoryStore::new();
        store.set_authenticated(true).unwrap();
        store.save_session_token(&SessionToken::new("sid=1")).unwrap();
        store.put(StoreKey::TimetableData, json!({})).unwrap();

        assert_eq!(logout(&store).unwrap(), Route::Login);
        assert!(store.is_empty());
        assert_eq!(require_auth(&store), Some(Route::Login));
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Dashboard.to_string(), "/dashboard");
        assert_eq!(Route::Login.path(), "/login");
    }
}
