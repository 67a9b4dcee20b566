//! Authentication flow types

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AuthError, AuthResult};
use crate::token::SessionToken;

/// Derived authentication state. Never stored; always recomputed from the
/// current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No token, or the token has expired.
    #[default]
    Unauthenticated,
    /// A token is present and not expired.
    Authenticated,
}

impl AuthState {
    /// Returns true for [`AuthState::Authenticated`].
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Not authenticated",
            Self::Authenticated => "Authenticated",
        }
    }
}

/// Effective client configuration used to build login and refresh calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client key registered with the identity service.
    pub client_key: String,
    /// Realm the client lives in.
    pub realm: String,
    /// Tenant derived from the host name, if any.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Where the authorization server sends the browser back to.
    pub redirect_uri: String,
}

/// Where to send the browser to start a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// Fully-built authorization URL.
    pub url: Url,
    /// Correlation state embedded in the URL and persisted locally.
    pub state: String,
    /// Client key the login was started for.
    pub client_key: String,
}

impl LoginRedirect {
    /// Builds `{auth_base}/auth/login/{client_key}?redirect_uri=..&state=..`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if `auth_base` is not an absolute
    /// URL that can carry a path.
    pub fn build(
        auth_base: &str,
        client_key: &str,
        redirect_uri: &str,
        state: impl Into<String>,
    ) -> AuthResult<Self> {
        let state = state.into();
        let mut url = Url::parse(auth_base)
            .map_err(|e| AuthError::Configuration(format!("invalid auth base URL {auth_base}: {e}")))?;

        url.path_segments_mut()
            .map_err(|()| {
                AuthError::Configuration(format!("auth base URL cannot be a base: {auth_base}"))
            })?
            .pop_if_empty()
            .extend(["auth", "login", client_key]);

        url.query_pairs_mut()
            .clear()
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", &state);

        Ok(Self {
            url,
            state,
            client_key: client_key.to_string(),
        })
    }
}

/// Query parameters carried by the return redirect.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CallbackParams {
    /// The issued token.
    #[serde(default)]
    pub token: Option<String>,
    /// Correlation state echoed back by the authorization server.
    #[serde(default)]
    pub state: Option<String>,
    /// Error code reported by the authorization server.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable error detail.
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parses either a full redirect URL or a bare query string
    /// (with or without the leading `?`).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Callback`] if the query cannot be decoded.
    pub fn parse(input: &str) -> AuthResult<Self> {
        let input = input.trim();
        let query = match Url::parse(input) {
            Ok(url) => url.query().unwrap_or_default().to_string(),
            Err(_) => input.trim_start_matches('?').to_string(),
        };
        serde_urlencoded::from_str(&query)
            .map_err(|e| AuthError::Callback(format!("unreadable callback parameters: {e}")))
    }

    /// Extracts the token, reporting the server's own error when present.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Callback`] when no usable token was returned.
    pub fn token(&self) -> AuthResult<SessionToken> {
        if let Some(error) = &self.error {
            let detail = self.error_description.as_deref().unwrap_or(error);
            return Err(AuthError::Callback(detail.to_string()));
        }
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::Callback("No token received from authentication server".to_string()))
            .and_then(SessionToken::new)
    }
}

/// What a callback invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The token was stored and listeners were notified.
    Authenticated(SessionToken),
    /// This redirect was already processed; nothing happened.
    AlreadyProcessed,
}

impl CallbackOutcome {
    /// The freshly stored token, if this call stored one.
    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        match self {
            Self::Authenticated(token) => Some(token),
            Self::AlreadyProcessed => None,
        }
    }
}
