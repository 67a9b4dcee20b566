//! Bearer token and its self-describing claims.
//!
//! Tokens are JWT-shaped: three base64url segments separated by dots. Only
//! the payload is read; the signature is never checked on the client.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// An opaque bearer credential.
///
/// Never empty. Replaced wholesale, never mutated.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a raw token string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmptyToken`] for an empty or blank string.
    pub fn new(raw: impl Into<String>) -> AuthResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(Self(raw))
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Get a preview of the token (first 8 chars + ...), safe for logs.
    #[must_use]
    pub fn preview(&self) -> String {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) if self.0.len() > 12 => format!("{}...", &self.0[..idx]),
            _ => self.0.clone(),
        }
    }

    /// Decodes the payload segment.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] if the token is not decodable.
    pub fn claims(&self) -> AuthResult<TokenClaims> {
        TokenClaims::decode(&self.0)
    }
}

// Keep tokens out of debug output.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&self.preview()).finish()
    }
}

impl TryFrom<String> for SessionToken {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

/// Claims embedded in a token payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch.
    pub expires_at: i64,
    /// Every payload claim, `exp` included.
    pub claims: Map<String, Value>,
}

impl TokenClaims {
    /// Decodes the payload of a `header.payload.signature` token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] when the token does not have
    /// three segments, the payload is not base64url JSON, or `exp` is
    /// missing or not a number.
    pub fn decode(token: &str) -> AuthResult<Self> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        // Some issuers pad their segments; base64url without padding is the norm.
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::MalformedToken(format!("payload is not base64url: {e}")))?;

        let claims: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedToken(format!("payload is not a JSON object: {e}")))?;

        let expires_at = match claims.get("exp") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.floor() as i64))
                .ok_or_else(|| AuthError::MalformedToken("exp is out of range".to_string()))?,
            Some(_) => {
                return Err(AuthError::MalformedToken("exp is not numeric".to_string()));
            }
            None => return Err(AuthError::MalformedToken("exp claim missing".to_string())),
        };

        Ok(Self { expires_at, claims })
    }

    /// Subject claim, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    /// Looks up an arbitrary string claim.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

/// Builds an unsigned token with the given payload.
///
/// Handy for tests and local tooling; the signature segment is a placeholder.
#[must_use]
pub fn encode_unsigned(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}
