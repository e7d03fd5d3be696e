//! The owned session: credential store, auth state and the current client.
//!
//! There is no global client. Whoever issues requests borrows the
//! `SessionClient` from a `Session`; login, guest entry and logout replace
//! that client with a freshly initialized one. Clones of a replaced client
//! keep working until dropped.

use tracing::{info, warn};

use crate::api::{ApiError, InitParams, SessionClient, SessionConfig};
use crate::auth::{AuthState, AuthStore, CredentialStore, Route};
use crate::models::{AccountType, LoginRequest, RegisterRequest, RegisterResponse, User};

pub struct Session {
    config: SessionConfig,
    store: CredentialStore,
    auth: AuthStore,
    client: SessionClient,
}

impl Session {
    /// Build the session at app start.
    ///
    /// A token left in storage by a previous run is picked up and the auth
    /// state starts authenticated; otherwise the session starts anonymous.
    pub fn start(config: SessionConfig, store: CredentialStore) -> Result<Self, ApiError> {
        let auth = AuthStore::new();
        let stored = store.read()?;

        let params = match stored {
            Some(ref token) => InitParams::authenticated(token.clone()),
            None => InitParams::anonymous(),
        };
        let client = SessionClient::initialize(&config, store.clone(), auth.clone(), params)?;

        if let Some(token) = stored {
            info!("Restored session from stored token");
            auth.login(token);
        }

        Ok(Self {
            config,
            store,
            auth,
            client,
        })
    }

    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn state(&self) -> AuthState {
        self.auth.snapshot()
    }

    pub fn landing_route(&self) -> Route {
        self.auth.snapshot().landing_route()
    }

    fn reinitialize(&mut self, params: InitParams) -> Result<(), ApiError> {
        self.client =
            SessionClient::initialize(&self.config, self.store.clone(), self.auth.clone(), params)?;
        Ok(())
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.client.register(request).await
    }

    /// Log in and switch to an authenticated client.
    ///
    /// The auth state is only touched once the token has been persisted.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        user_type: AccountType,
    ) -> Result<User, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            user_type,
        };
        self.login_with(&request).await
    }

    pub async fn login_with(&mut self, request: &LoginRequest) -> Result<User, ApiError> {
        let response = self.client.login(request).await?;
        if response.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "login response carried an empty access_token".to_string(),
            ));
        }

        self.reinitialize(InitParams::authenticated(response.access_token.clone()))?;
        self.auth.login(response.access_token);
        self.auth.set_user(Some(response.user.clone()));
        info!(role = ?response.user.role, "Login successful");
        Ok(response.user)
    }

    /// Enter guest mode. Guests never send a token, so any stored one is cleared.
    ///
    /// If the stored token cannot be cleared nothing changes: the previous
    /// client and auth state stay in place.
    pub fn login_as_guest(&mut self) -> Result<(), ApiError> {
        if let Err(e) = self.reinitialize(InitParams::anonymous()) {
            warn!(error = %e, "Failed to enter guest mode");
            return Err(e);
        }
        self.auth.login_as_guest();
        Ok(())
    }

    /// Return to the anonymous state and forget the stored token.
    ///
    /// The auth state is only reset once the stored token is gone.
    pub fn logout(&mut self) -> Result<(), ApiError> {
        if let Err(e) = self.reinitialize(InitParams::anonymous()) {
            warn!(error = %e, "Failed to log out");
            return Err(e);
        }
        self.auth.logout();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryBackend, StorageError, TokenBackend};
    use reqwest::Url;
    use std::sync::Arc;

    /// Holds a token but refuses to delete it
    struct StuckBackend(MemoryBackend);

    impl TokenBackend for StuckBackend {
        fn read(&self) -> Result<Option<String>, StorageError> {
            self.0.read()
        }
        fn write(&self, token: &str) -> Result<(), StorageError> {
            self.0.write(token)
        }
        fn delete(&self) -> Result<(), StorageError> {
            Err(StorageError::Delete("keychain locked".to_string()))
        }
    }

    fn stuck_store(token: &str) -> CredentialStore {
        let store = CredentialStore::new(Arc::new(StuckBackend(MemoryBackend::new())));
        store.save(token).unwrap();
        store
    }

    fn config() -> SessionConfig {
        SessionConfig::new(Url::parse("https://api.example.com").unwrap())
    }

    #[test]
    fn test_start_without_token_is_anonymous() {
        let session = Session::start(config(), CredentialStore::in_memory()).unwrap();
        assert!(!session.state().is_authenticated());
        assert!(!session.client().is_authenticated());
        assert_eq!(session.landing_route(), Route::Home);
    }

    #[test]
    fn test_start_restores_stored_token() {
        let store = CredentialStore::in_memory();
        store.save("T9").unwrap();
        let session = Session::start(config(), store).unwrap();
        assert!(session.client().is_authenticated());
        assert_eq!(session.state().token(), Some("T9"));
    }

    #[test]
    fn test_guest_clears_stored_token() {
        let store = CredentialStore::in_memory();
        store.save("T9").unwrap();
        let mut session = Session::start(config(), store.clone()).unwrap();
        session.login_as_guest().unwrap();
        let state = session.state();
        assert!(state.is_guest());
        assert_eq!(state.token(), None);
        assert!(!state.can_access_guest_protected_route());
        assert_eq!(store.read().unwrap(), None);
        assert!(!session.client().is_authenticated());
    }

    #[test]
    fn test_logout_resets_everything() {
        let store = CredentialStore::in_memory();
        store.save("T9").unwrap();
        let mut session = Session::start(config(), store.clone()).unwrap();
        session.logout().unwrap();
        assert_eq!(session.state(), AuthState::default());
        assert!(!store.has_token());
    }

    #[test]
    fn test_failed_logout_keeps_session_intact() {
        let mut session = Session::start(config(), stuck_store("T9")).unwrap();

        let err = session.logout().unwrap_err();
        assert!(matches!(err, ApiError::Storage(StorageError::Delete(_))));
        assert!(session.state().is_authenticated());
        assert_eq!(session.state().token(), Some("T9"));
        assert!(session.client().is_authenticated());
    }

    #[test]
    fn test_failed_guest_entry_keeps_session_intact() {
        let mut session = Session::start(config(), stuck_store("T9")).unwrap();

        assert!(session.login_as_guest().is_err());
        assert!(!session.state().is_guest());
        assert_eq!(session.state().token(), Some("T9"));
        assert!(session.client().is_authenticated());
    }
}
