//! Refresh client port

use async_trait::async_trait;
use portcullis_domain::{AuthResult, SessionToken};

/// Network exchanges backed by the ambient (cookie) session.
///
/// Neither call uses the bearer token; they rely on the session cookie
/// set by the identity service during login.
#[async_trait]
pub trait RefreshClient: Send + Sync {
    /// Obtains a new token for `client_key`.
    ///
    /// # Errors
    ///
    /// Returns [`portcullis_domain::AuthError::RefreshFailed`] when the
    /// endpoint rejects the session or cannot be reached.
    async fn refresh(&self, client_key: &str) -> AuthResult<SessionToken>;

    /// Tears down the server-side session for `client_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout call fails.
    async fn logout(&self, client_key: &str) -> AuthResult<()>;
}
