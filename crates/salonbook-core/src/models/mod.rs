//! Data models exchanged with the backend and the places service.
//!
//! - `User`, `UserRole`: the signed-in account
//! - `LoginRequest`, `RegisterRequest`, `LoginResponse`: `/api/auth` bodies
//! - `Salon`: a nearby salon from the places lookup

pub mod auth;
pub mod place;
pub mod user;

pub use auth::{AccountType, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
pub use place::Salon;
pub use user::{User, UserRole};
