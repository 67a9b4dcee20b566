//! Redirect-based login flow.
//!
//! `begin_login` builds the authorization URL and persists a one-shot
//! correlation state; the caller navigates. `complete_login` turns the
//! return redirect into a stored token. Neither performs navigation.

use std::sync::Arc;

use parking_lot::Mutex;
use portcullis_domain::{
    AuthError, AuthResult, CallbackOutcome, CallbackParams, LoginRedirect, generate_state,
};
use tracing::{debug, error, info, warn};

use super::session::SessionManager;
use crate::ports::ClientConfigResolver;

/// Login/callback exchange against a centralized authorization service.
pub struct RedirectAuthFlow {
    manager: Arc<SessionManager>,
    resolver: Arc<dyn ClientConfigResolver>,
    auth_base_url: String,
    require_state: bool,
    // Identity of the last redirect that stored a token.
    processed: Mutex<Option<String>>,
}

impl RedirectAuthFlow {
    /// Creates a flow that logs in through `auth_base_url`.
    #[must_use]
    pub fn new(
        manager: Arc<SessionManager>,
        resolver: Arc<dyn ClientConfigResolver>,
        auth_base_url: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            resolver,
            auth_base_url: auth_base_url.into(),
            require_state: true,
            processed: Mutex::new(None),
        }
    }

    /// Whether callbacks must echo the persisted state. Defaults to `true`.
    #[must_use]
    pub const fn with_require_state(mut self, require_state: bool) -> Self {
        self.require_state = require_state;
        self
    }

    /// The session this flow feeds.
    #[must_use]
    pub const fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Starts a login.
    ///
    /// Explicit arguments override whatever the client configuration lookup
    /// resolves. A fresh state is persisted and embedded in the returned URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be persisted or the
    /// authorization URL cannot be built.
    pub async fn begin_login(
        &self,
        client_key: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> AuthResult<LoginRedirect> {
        let config = self.resolver.resolve(client_key).await;
        let client_key = client_key.unwrap_or(&config.client_key);
        let redirect_uri = redirect_uri.unwrap_or(&config.redirect_uri);

        let state = generate_state();
        let redirect = LoginRedirect::build(&self.auth_base_url, client_key, redirect_uri, state)?;
        self.manager.store().save_state(&redirect.state)?;

        info!(
            client_key = %redirect.client_key,
            redirect_uri = %redirect_uri,
            "initiating login"
        );
        Ok(redirect)
    }

    /// Completes a login from the return redirect (full URL or query).
    ///
    /// A repeated call for a redirect that already stored its token is a
    /// no-op returning [`CallbackOutcome::AlreadyProcessed`].
    ///
    /// # Errors
    ///
    /// - [`AuthError::Callback`] when the redirect carries no usable token.
    /// - [`AuthError::StateMismatch`] when state verification is required
    ///   and the returned state does not match the persisted one.
    /// - [`AuthError::Storage`] when the token cannot be stored.
    pub fn complete_login(&self, redirect: &str) -> AuthResult<CallbackOutcome> {
        let params = CallbackParams::parse(redirect)?;
        let fingerprint = fingerprint(&params);

        if self.processed.lock().as_deref() == Some(fingerprint.as_str()) {
            debug!("callback already processed, ignoring");
            return Ok(CallbackOutcome::AlreadyProcessed);
        }

        let token = params.token().inspect_err(|e| {
            error!(error = %e, "no access token provided");
        })?;
        self.verify_state(params.state.as_deref())?;

        // Listeners run inside set_token and may call back into the flow,
        // so the guard is not held across it.
        self.manager.set_token(token.clone())?;
        *self.processed.lock() = Some(fingerprint);
        info!(token = %token.preview(), "authentication successful");
        Ok(CallbackOutcome::Authenticated(token))
    }

    /// Forgets the processed redirect and starts a new login.
    ///
    /// # Errors
    ///
    /// Same as [`RedirectAuthFlow::begin_login`].
    pub async fn retry_login(
        &self,
        client_key: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> AuthResult<LoginRedirect> {
        self.processed.lock().take();
        self.begin_login(client_key, redirect_uri).await
    }

    fn verify_state(&self, returned: Option<&str>) -> AuthResult<()> {
        let expected = self.manager.store().take_state()?;
        match (expected.as_deref(), returned) {
            (Some(expected), Some(returned)) if expected == returned => Ok(()),
            (expected, returned) if self.require_state => {
                warn!(
                    pending = expected.is_some(),
                    returned = returned.is_some(),
                    "login state mismatch, rejecting callback"
                );
                Err(AuthError::StateMismatch)
            }
            (expected, returned) => {
                warn!(
                    pending = expected.is_some(),
                    returned = returned.is_some(),
                    "login state not verified"
                );
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for RedirectAuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectAuthFlow")
            .field("auth_base_url", &self.auth_base_url)
            .field("require_state", &self.require_state)
            .finish_non_exhaustive()
    }
}

fn fingerprint(params: &CallbackParams) -> String {
    format!(
        "{}\u{1f}{}",
        params.state.as_deref().unwrap_or_default(),
        params.token.as_deref().unwrap_or_default()
    )
}
