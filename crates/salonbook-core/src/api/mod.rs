//! REST client module for the salonbook backend.
//!
//! This module provides the `SessionClient`, an HTTP client bound to one
//! session epoch, and the `ApiError` taxonomy its calls fail with.
//!
//! The backend uses bearer token authentication obtained from
//! `/api/auth/login`.

pub mod client;
pub mod error;

pub use client::{InitParams, SessionClient, SessionConfig, MOBILE_FLAG, REQUEST_TIMEOUT_MS};
pub use error::{ApiError, FieldError, ServerError};
