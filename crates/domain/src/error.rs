//! Domain error types

use thiserror::Error;

/// Errors raised by the session lifecycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token is not a decodable `header.payload.signature` triple.
    ///
    /// Callers treat this exactly like an expired token.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The refresh endpoint rejected the request or was unreachable.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The login redirect carried no usable token.
    #[error("authentication callback failed: {0}")]
    Callback(String),

    /// The `state` returned by the authorization server does not match the
    /// one persisted when login started.
    #[error("authentication state mismatch")]
    StateMismatch,

    /// An empty string was offered as a bearer credential.
    #[error("token must not be empty")]
    EmptyToken,

    /// The persistent session store could not be read or written.
    #[error("session storage error: {0}")]
    Storage(String),

    /// A configured endpoint is unusable.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Returns true if the user has to go through the login redirect again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::RefreshFailed(_) | Self::Callback(_) | Self::StateMismatch
        )
    }
}

/// Result type alias for session operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_errors_require_login() {
        assert!(AuthError::Callback("no token".to_string()).requires_login());
        assert!(AuthError::StateMismatch.requires_login());
        assert!(!AuthError::EmptyToken.requires_login());
        assert!(!AuthError::Storage("disk full".to_string()).requires_login());
        assert!(!AuthError::Configuration("bad URL".to_string()).requires_login());
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            AuthError::RefreshFailed("HTTP 401".to_string()).to_string(),
            "token refresh failed: HTTP 401"
        );
        assert_eq!(AuthError::EmptyToken.to_string(), "token must not be empty");
    }
}
