//! In-memory authentication state and its observable handle.
//!
//! `AuthState` is a plain value with four transitions. `AuthStore` shares one
//! `AuthState` between the UI and the session client and notifies
//! subscribers on every change.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::models::User;

/// Screen a freshly started app should open on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    AdminProfile,
    CustomerHome,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/home",
            Route::AdminProfile => "/admin/profile",
            Route::CustomerHome => "/customer/home",
        }
    }
}

/// Coarse phase of the auth state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Guest,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    is_authenticated: bool,
    is_guest: bool,
    token: Option<String>,
    user: Option<User>,
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the authenticated state. The user is left as-is; callers set it
    /// with `set_user` once the login response has been read.
    pub fn login(&mut self, token: String) {
        self.is_authenticated = true;
        self.is_guest = false;
        self.token = Some(token);
    }

    pub fn login_as_guest(&mut self) {
        self.is_authenticated = true;
        self.is_guest = true;
        self.token = None;
    }

    pub fn logout(&mut self) {
        *self = Self::default();
    }

    /// Replace the user record. Does not touch the auth flags or the token.
    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_guest(&self) -> bool {
        self.is_guest
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The user record as last set, regardless of the auth flags
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn phase(&self) -> AuthPhase {
        match (self.is_authenticated, self.is_guest) {
            (false, _) => AuthPhase::Anonymous,
            (true, true) => AuthPhase::Guest,
            (true, false) => AuthPhase::Authenticated,
        }
    }

    /// Signed-in users only; guests are turned away
    pub fn can_access_guest_protected_route(&self) -> bool {
        self.is_authenticated && !self.is_guest
    }

    /// The user record, or `None` whenever the state is not authenticated
    pub fn trusted_user(&self) -> Option<&User> {
        if self.is_authenticated {
            self.user.as_ref()
        } else {
            None
        }
    }

    pub fn landing_route(&self) -> Route {
        if !self.is_authenticated {
            return Route::Home;
        }
        match self.trusted_user() {
            Some(user) if user.is_salon_admin() => Route::AdminProfile,
            _ => Route::CustomerHome,
        }
    }
}

/// Shared, observable handle to the process-wide `AuthState`.
/// Clone is cheap - all clones observe and mutate the same state.
#[derive(Clone)]
pub struct AuthStore {
    tx: Arc<watch::Sender<AuthState>>,
}

impl AuthStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::new());
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that wakes on every transition
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.tx.borrow().user.clone()
    }

    pub fn login(&self, token: String) {
        info!("Auth state: authenticated");
        self.tx.send_modify(|state| state.login(token));
    }

    pub fn login_as_guest(&self) {
        info!("Auth state: guest");
        self.tx.send_modify(AuthState::login_as_guest);
    }

    pub fn logout(&self) {
        info!("Auth state: anonymous");
        self.tx.send_modify(AuthState::logout);
    }

    pub fn set_user(&self, user: Option<User>) {
        self.tx.send_modify(|state| state.set_user(user));
    }

    pub fn can_access_guest_protected_route(&self) -> bool {
        self.tx.borrow().can_access_guest_protected_route()
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}
