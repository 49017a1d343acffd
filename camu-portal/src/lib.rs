//! camu portal - student-portal client for the mycamu college API
//!
//! Talks to the college API through a running `camu-gateway`, keeps the
//! session and the fetched records in a local store, and renders the
//! dashboard, timetable and course pages as text.

pub mod client;
pub mod config;
pub mod gateway;
pub mod login;
pub mod models;
pub mod store;
pub mod views;

#[cfg(test)]
mod testing;

pub use client::{ClientError, DomainClient, LoginRequest, Operation};
pub use config::{AcademicYearField, PortalConfig};
pub use gateway::{GatewayTransport, HttpGateway, SessionToken, TransportError};
pub use login::{LoginError, LoginFlow, LoginOutcome, LoginStep, StepPolicy, StepStatus};
pub use store::{FileStore, MemoryStore, SessionStore, SnapshotStore, StoreError, StoreKey};
pub use views::{logout, Mounted, Route};
