//! Core library for salonbook.
//!
//! Session management for the salonbook booking app: the persisted bearer
//! token, the observable auth state, the session-scoped HTTP client with its
//! request and response policies, and the nearby salon lookup.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod places;
pub mod session;

pub use api::{ApiError, InitParams, SessionClient, SessionConfig};
pub use auth::{AuthState, AuthStore, CredentialStore, Route, StorageError};
pub use config::{Config, ConfigError, UnauthorizedPolicy};
pub use session::Session;
