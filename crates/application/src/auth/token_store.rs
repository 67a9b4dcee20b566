//! Persistent token storage.
//!
//! Holds the single current bearer token plus the one-shot login
//! correlation state, and keeps the shared client's `Authorization`
//! header in step with whatever token is stored.

use std::sync::Arc;

use portcullis_domain::{AuthError, AuthResult, SessionToken};
use tracing::{debug, error, warn};

use crate::ports::{AuthorizationHeader, SessionStorage, StorageError};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "authToken";

/// Storage key holding the pending login correlation state.
pub const STATE_KEY: &str = "authState";

/// Token store over a persistent [`SessionStorage`].
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn SessionStorage>,
    header: Arc<dyn AuthorizationHeader>,
}

impl TokenStore {
    /// Creates a store and primes the authorization header from any token
    /// left over from a previous run.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>, header: Arc<dyn AuthorizationHeader>) -> Self {
        let store = Self { storage, header };
        match store.get() {
            Some(token) => store.header.set_bearer(&token),
            None => store.header.clear(),
        }
        store
    }

    /// Returns the stored token, if any.
    ///
    /// Unreadable storage is logged and reported as "no token".
    #[must_use]
    pub fn get(&self) -> Option<SessionToken> {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(raw)) => SessionToken::new(raw).ok(),
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "failed to read stored token");
                None
            }
        }
    }

    /// Persists `token` and attaches it to outbound requests.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the token cannot be persisted; the
    /// authorization header is left untouched in that case.
    pub fn set(&self, token: &SessionToken) -> AuthResult<()> {
        self.storage
            .set(TOKEN_KEY, token.as_str())
            .map_err(storage_error)?;
        self.header.set_bearer(token);
        debug!(token = %token.preview(), "stored access token");
        Ok(())
    }

    /// Removes the token and stops sending the authorization header.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if storage cannot be written. The
    /// header is cleared regardless.
    pub fn clear(&self) -> AuthResult<()> {
        self.header.clear();
        self.storage.remove(TOKEN_KEY).map_err(storage_error)
    }

    /// Persists the correlation state for a login that is about to start.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if storage cannot be written.
    pub fn save_state(&self, state: &str) -> AuthResult<()> {
        self.storage.set(STATE_KEY, state).map_err(storage_error)
    }

    /// Reads and removes the pending correlation state.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if storage cannot be accessed.
    pub fn take_state(&self) -> AuthResult<Option<String>> {
        let state = self.storage.get(STATE_KEY).map_err(storage_error)?;
        if state.is_some()
            && let Err(e) = self.storage.remove(STATE_KEY)
        {
            warn!(error = %e, "failed to remove consumed login state");
        }
        Ok(state)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

fn storage_error(e: StorageError) -> AuthError {
    AuthError::Storage(e.to_string())
}
