//! Ambient authorization header port

use portcullis_domain::SessionToken;

/// The default `Authorization` header of the shared HTTP client.
///
/// The token store keeps it in sync so every outbound request carries
/// `Bearer <token>` while a token exists, and nothing otherwise.
pub trait AuthorizationHeader: Send + Sync {
    /// Attach `Authorization: Bearer <token>` to subsequent requests.
    fn set_bearer(&self, token: &SessionToken);

    /// Stop sending an `Authorization` header.
    fn clear(&self);
}
