//! Session store
//!
//! Local key/value persistence for the session: one snapshot per upstream
//! payload, the authenticated flag and the opaque session cookie.
//!
//! - `SessionStore` is the raw, object-safe interface implementations provide
//! - `SnapshotStore` adds typed helpers on top of any `SessionStore`
//!
//! No eviction, no expiry, no per-user namespacing: one session per store.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::gateway::SessionToken;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Fixed logical names under which snapshots are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    LoginData,
    InstituteData,
    StudentProgData,
    AttendanceData,
    TimetableData,
    TeachingContentData,
    IsAuthenticated,
    SessionCookie,
}

impl StoreKey {
    pub const ALL: [StoreKey; 8] = [
        StoreKey::LoginData,
        StoreKey::InstituteData,
        StoreKey::StudentProgData,
        StoreKey::AttendanceData,
        StoreKey::TimetableData,
        StoreKey::TeachingContentData,
        StoreKey::IsAuthenticated,
        StoreKey::SessionCookie,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::LoginData => "loginData",
            StoreKey::InstituteData => "instituteData",
            StoreKey::StudentProgData => "studentProgData",
            StoreKey::AttendanceData => "attendanceData",
            StoreKey::TimetableData => "timetableData",
            StoreKey::TeachingContentData => "teachingContentData",
            StoreKey::IsAuthenticated => "isAuthenticated",
            StoreKey::SessionCookie => "sessionCookie",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait SessionStore: Send + Sync {
    /// Overwrites whatever was stored under `key`.
    fn put(&self, key: StoreKey, value: Value) -> Result<(), StoreError>;

    fn get(&self, key: StoreKey) -> Option<Value>;

    /// Removes every key in [`StoreKey::ALL`].
    fn clear_all(&self) -> Result<(), StoreError>;
}

/// Typed access on top of [`SessionStore`].
pub trait SnapshotStore {
    fn save<T: Serialize>(&self, key: StoreKey, value: &T) -> Result<(), StoreError>;

    /// `None` when nothing is stored or the stored JSON has another shape.
    fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T>;

    fn is_authenticated(&self) -> bool;

    fn set_authenticated(&self, authenticated: bool) -> Result<(), StoreError>;

    fn session_token(&self) -> Option<SessionToken>;

    fn save_session_token(&self, token: &SessionToken) -> Result<(), StoreError>;
}

impl<S: SessionStore + ?Sized> SnapshotStore for S {
    fn save<T: Serialize>(&self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        self.put(key, serde_json::to_value(value)?)
    }

    fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(%key, "stored value has unexpected shape: {e}");
                None
            }
        }
    }

    fn is_authenticated(&self) -> bool {
        match self.get(StoreKey::IsAuthenticated) {
            Some(Value::Bool(flag)) => flag,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    fn set_authenticated(&self, authenticated: bool) -> Result<(), StoreError> {
        self.put(StoreKey::IsAuthenticated, Value::Bool(authenticated))
    }

    fn session_token(&self) -> Option<SessionToken> {
        match self.get(StoreKey::SessionCookie)? {
            Value::String(s) if !s.is_empty() => Some(SessionToken::new(s)),
            _ => None,
        }
    }

    fn save_session_token(&self, token: &SessionToken) -> Result<(), StoreError> {
        self.put(StoreKey::SessionCookie, Value::String(token.as_str().to_string()))
    }
}
