//! Authentication state and credential persistence.
//!
//! This module provides:
//! - `CredentialStore`: the single persisted bearer token (OS keychain or memory)
//! - `AuthState` / `AuthStore`: the observable in-memory login state
//! - `LoginForm` / `SignupForm`: checks run before credentials are sent

pub mod credentials;
pub mod forms;
pub mod state;

pub use credentials::{CredentialStore, KeyringBackend, MemoryBackend, StorageError, TokenBackend};
pub use forms::{FormError, LoginForm, SignupForm};
pub use state::{AuthPhase, AuthState, AuthStore, Route};
