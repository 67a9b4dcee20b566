//! Session lifecycle manager.
//!
//! Owns the current token through [`TokenStore`], judges expiry through
//! [`TokenInspector`], renews through a [`RefreshClient`] and fans changes
//! out to subscribers. Constructed once and shared behind an `Arc`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::ReentrantMutex;
use portcullis_domain::{AuthError, AuthResult, AuthState, SessionToken};
use tracing::{debug, info, warn};

use super::inspector::{TokenInspector, TokenStatus};
use super::listeners::{ListenerRegistry, Subscription};
use super::token_store::TokenStore;
use crate::ports::RefreshClient;

/// Default remaining-lifetime threshold below which a refresh is attempted.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(15 * 60);

/// Result of one background refresh check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No token stored; nothing to do.
    NoToken,
    /// Token has enough lifetime left.
    StillFresh {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Another refresh is already running; this check was skipped.
    InFlight,
    /// A new token was obtained and stored.
    Refreshed(SessionToken),
    /// Refresh failed; the previous token is still in place.
    Failed(AuthError),
}

/// Session lifecycle manager.
pub struct SessionManager {
    store: TokenStore,
    inspector: TokenInspector,
    refresh_client: Arc<dyn RefreshClient>,
    listeners: ListenerRegistry,
    client_key: String,
    refresh_threshold: Duration,
    // Serializes store writes with their fan-out; re-entrant so listeners
    // can call back into the manager.
    write_guard: ReentrantMutex<()>,
    refresh_in_flight: AtomicBool,
}

impl SessionManager {
    /// Creates a manager refreshing tokens for `client_key`.
    #[must_use]
    pub fn new(
        store: TokenStore,
        inspector: TokenInspector,
        refresh_client: Arc<dyn RefreshClient>,
        client_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            inspector,
            refresh_client,
            listeners: ListenerRegistry::new(),
            client_key: client_key.into(),
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            write_guard: ReentrantMutex::new(()),
            refresh_in_flight: AtomicBool::new(false),
        }
    }

    /// Set the remaining-lifetime threshold that triggers a refresh.
    #[must_use]
    pub const fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    /// Client key used for refresh and logout.
    #[must_use]
    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// The inspector used for expiry decisions.
    #[must_use]
    pub const fn inspector(&self) -> &TokenInspector {
        &self.inspector
    }

    pub(crate) const fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Current token, if any.
    #[must_use]
    pub fn get_token(&self) -> Option<SessionToken> {
        self.store.get()
    }

    /// Token present and not expired.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth_state().is_authenticated()
    }

    /// Derived authentication state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        match self.get_token() {
            Some(token) if !self.inspector.is_expired(&token) => AuthState::Authenticated,
            _ => AuthState::Unauthenticated,
        }
    }

    /// Display status of the current token.
    #[must_use]
    pub fn status(&self) -> TokenStatus {
        let threshold = i64::try_from(self.refresh_threshold.as_secs()).unwrap_or(i64::MAX);
        self.inspector.status(self.get_token().as_ref(), threshold)
    }

    /// Replaces the token and notifies listeners with `(new, previous)`.
    ///
    /// Storing the token that is already stored is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the token cannot be persisted; no
    /// listener is notified in that case.
    pub fn set_token(&self, token: SessionToken) -> AuthResult<()> {
        let _guard = self.write_guard.lock();
        let previous = self.store.get();
        if previous.as_ref() == Some(&token) {
            debug!("token unchanged, skipping notification");
            return Ok(());
        }
        self.store.set(&token)?;
        self.listeners.notify(Some(&token), previous.as_ref());
        Ok(())
    }

    /// Removes the token and notifies listeners with `(None, previous)`.
    ///
    /// Clearing when nothing is stored notifies nobody.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if storage cannot be written.
    pub fn clear_token(&self) -> AuthResult<()> {
        let _guard = self.write_guard.lock();
        let previous = self.store.get();
        self.store.clear()?;
        if previous.is_some() {
            debug!("token cleared");
            self.listeners.notify(None, previous.as_ref());
        }
        Ok(())
    }

    /// Subscribes to token changes.
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&SessionToken>, Option<&SessionToken>) + Send + Sync + 'static,
    {
        self.listeners.add(callback)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// One background check: refresh the token if it is inside the refresh
    /// window.
    ///
    /// Never clears the token. A failed refresh is logged and the existing
    /// token stays in place; the next tick tries again.
    pub async fn refresh_tick(&self) -> RefreshOutcome {
        let Some(token) = self.get_token() else {
            return RefreshOutcome::NoToken;
        };

        let threshold = i64::try_from(self.refresh_threshold.as_secs()).unwrap_or(i64::MAX);
        match self.inspector.seconds_until_expiry(&token) {
            Ok(secs) if secs >= threshold => {
                return RefreshOutcome::StillFresh {
                    seconds_remaining: secs,
                };
            }
            Ok(secs) => debug!(seconds_remaining = secs, "token inside refresh window"),
            Err(e) => warn!(error = %e, "stored token unreadable, attempting refresh"),
        }

        let Some(_in_flight) = InFlight::acquire(&self.refresh_in_flight) else {
            debug!("refresh already in flight, skipping tick");
            return RefreshOutcome::InFlight;
        };

        match self.refresh_client.refresh(&self.client_key).await {
            Ok(new_token) => match self.set_token(new_token.clone()) {
                Ok(()) => {
                    info!(client_key = %self.client_key, "token refreshed");
                    RefreshOutcome::Refreshed(new_token)
                }
                Err(e) => {
                    warn!(error = %e, "refreshed token could not be stored");
                    RefreshOutcome::Failed(e)
                }
            },
            Err(e) => {
                warn!(client_key = %self.client_key, error = %e, "token refresh failed");
                RefreshOutcome::Failed(e)
            }
        }
    }

    /// Ends the server-side session, then clears the local token.
    ///
    /// The server call is best effort: its failure is logged and the local
    /// token is cleared anyway.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the local token cannot be removed.
    pub async fn logout(&self) -> AuthResult<()> {
        match self.refresh_client.logout(&self.client_key).await {
            Ok(()) => info!(client_key = %self.client_key, "logout successful"),
            Err(e) => warn!(client_key = %self.client_key, error = %e, "logout failed"),
        }
        self.clear_token()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("client_key", &self.client_key)
            .field("refresh_threshold", &self.refresh_threshold)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Holds the in-flight flag; released on drop, including cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
