//! Durable storage for the single bearer token.
//!
//! Every read goes to the backend; nothing is cached in memory, so a token
//! cleared by one holder is immediately absent for every other holder.

use std::sync::{Arc, Mutex};

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Keychain service name
const SERVICE_NAME: &str = "salonbook";

/// Keychain account under which the bearer token lives
const TOKEN_KEY: &str = "authToken";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Secure storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read token from secure storage: {0}")]
    Read(String),

    #[error("Failed to write token to secure storage: {0}")]
    Write(String),

    #[error("Failed to delete token from secure storage: {0}")]
    Delete(String),
}

/// A place a single token can be persisted.
///
/// `delete` must succeed when nothing is stored.
pub trait TokenBackend: Send + Sync {
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&self, token: &str) -> Result<(), StorageError>;
    fn delete(&self) -> Result<(), StorageError>;
}

/// OS keychain backend
pub struct KeyringBackend {
    service: String,
    account: String,
}

impl KeyringBackend {
    pub fn new() -> Self {
        Self::with_names(SERVICE_NAME, TOKEN_KEY)
    }

    pub fn with_names(service: &str, account: &str) -> Self {
        Self {
            service: service.to_string(),
            account: account.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry, StorageError> {
        Entry::new(&self.service, &self.account)
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBackend for KeyringBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        self.entry()?
            .set_password(token)
            .map_err(|e| StorageError::Write(e.to_string()))
    }

    fn delete(&self) -> Result<(), StorageError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Delete(e.to_string())),
        }
    }
}

/// Process-local backend, used when no keychain is wanted (tests, guest-only runs)
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StorageError> {
        self.slot
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))
    }
}

impl TokenBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn write(&self, token: &str) -> Result<(), StorageError> {
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<(), StorageError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// Handle to the persisted bearer token.
/// Clone is cheap - all clones share one backend.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn TokenBackend>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn TokenBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by the OS keychain
    pub fn keyring() -> Self {
        Self::new(Arc::new(KeyringBackend::new()))
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Persist the token, replacing any previous one
    pub fn save(&self, token: &str) -> Result<(), StorageError> {
        debug!("Saving token to secure storage");
        self.backend.write(token)
    }

    /// Remove the persisted token. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), StorageError> {
        debug!("Clearing token from secure storage");
        self.backend.delete()
    }

    pub fn read(&self) -> Result<Option<String>, StorageError> {
        self.backend.read()
    }

    /// Check whether a token is currently persisted
    pub fn has_token(&self) -> bool {
        matches!(self.read(), Ok(Some(_)))
    }
}
