//! Token expiry inspection.

use std::sync::Arc;

use portcullis_domain::{AuthResult, SessionToken, TokenClaims};

use crate::ports::Clock;

/// Reads token expiry against an injected clock.
///
/// The signature is never verified; the server remains the authority.
#[derive(Clone)]
pub struct TokenInspector {
    clock: Arc<dyn Clock>,
}

impl TokenInspector {
    /// Creates an inspector using `clock` for "now".
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Decodes the token's claims.
    ///
    /// # Errors
    ///
    /// Returns [`portcullis_domain::AuthError::MalformedToken`] if the token
    /// cannot be decoded.
    pub fn decode(&self, token: &SessionToken) -> AuthResult<TokenClaims> {
        token.claims()
    }

    /// True when the token cannot be decoded or `now >= exp`.
    #[must_use]
    pub fn is_expired(&self, token: &SessionToken) -> bool {
        self.decode(token).map_or(true, |claims| {
            self.clock.now_millis() >= claims.expires_at.saturating_mul(1000)
        })
    }

    /// Seconds left before expiry; negative once expired.
    ///
    /// # Errors
    ///
    /// Returns [`portcullis_domain::AuthError::MalformedToken`] if the token
    /// cannot be decoded.
    pub fn seconds_until_expiry(&self, token: &SessionToken) -> AuthResult<i64> {
        let claims = self.decode(token)?;
        let remaining_ms = claims
            .expires_at
            .saturating_mul(1000)
            .saturating_sub(self.clock.now_millis());
        Ok(remaining_ms.div_euclid(1000))
    }

    /// Status of an optional token for display.
    #[must_use]
    pub fn status(&self, token: Option<&SessionToken>, refresh_threshold_secs: i64) -> TokenStatus {
        let Some(token) = token else {
            return TokenStatus::NotAuthenticated;
        };
        match self.seconds_until_expiry(token) {
            Err(_) => TokenStatus::Malformed,
            Ok(_) if self.is_expired(token) => TokenStatus::Expired,
            Ok(secs) if secs < refresh_threshold_secs => TokenStatus::Expiring {
                seconds_remaining: secs,
            },
            Ok(secs) => TokenStatus::Valid {
                seconds_remaining: secs,
            },
        }
    }
}

impl std::fmt::Debug for TokenInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenInspector").finish_non_exhaustive()
    }
}

/// Status of a token for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token is stored.
    NotAuthenticated,
    /// Token is valid and not inside the refresh window.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token is valid but inside the refresh window.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token has expired.
    Expired,
    /// Token cannot be decoded.
    Malformed,
}

impl TokenStatus {
    /// Returns true if the token is valid (not expired).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Valid { seconds_remaining } => {
                let secs = *seconds_remaining;
                if secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Expiring { seconds_remaining } => {
                format!("Expiring in {seconds_remaining} seconds (will auto-refresh)")
            }
            Self::Expired => "Expired".to_string(),
            Self::Malformed => "Unreadable token".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::testing::{FixedClock, NOW_SECS, token_expiring_in, token_with_exp};
    use portcullis_domain::AuthError;
    use pretty_assertions::assert_eq;

    fn inspector() -> (TokenInspector, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::default());
        (TokenInspector::new(clock.clone()), clock)
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let (inspector, _) = inspector();
        assert!(inspector.is_expired(&token_expiring_in(0)));
        assert!(!inspector.is_expired(&token_expiring_in(1)));
    }

    #[test]
    fn one_millisecond_before_expiry_is_valid() {
        let (inspector, clock) = inspector();
        let token = token_expiring_in(0);
        clock.set_millis(NOW_SECS * 1000 - 1);
        assert!(!inspector.is_expired(&token));
    }

    #[test]
    fn malformed_token_counts_as_expired() {
        let (inspector, _) = inspector();
        let token = SessionToken::new("not-a-jwt").unwrap();
        assert!(inspector.is_expired(&token));
        assert!(matches!(
            inspector.decode(&token),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn seconds_until_expiry_counts_down() {
        let (inspector, _) = inspector();
        assert_eq!(inspector.seconds_until_expiry(&token_expiring_in(600)).unwrap(), 600);
        assert_eq!(inspector.seconds_until_expiry(&token_expiring_in(-30)).unwrap(), -30);
    }

    #[test]
    fn extreme_expiry_values_saturate() {
        let (inspector, _) = inspector();
        let ancient = token_with_exp(i64::MIN, "x");
        let distant = token_with_exp(i64::MAX, "x");

        assert!(inspector.is_expired(&ancient));
        assert!(inspector.seconds_until_expiry(&ancient).unwrap() < 0);
        assert_eq!(inspector.status(Some(&ancient), 900), TokenStatus::Expired);

        assert!(!inspector.is_expired(&distant));
        assert!(inspector.seconds_until_expiry(&distant).unwrap() > 0);
    }

    #[test]
    fn status_reflects_refresh_window() {
        let (inspector, _) = inspector();
        assert_eq!(inspector.status(None, 900), TokenStatus::NotAuthenticated);
        assert_eq!(
            inspector.status(Some(&token_expiring_in(600)), 900),
            TokenStatus::Expiring {
                seconds_remaining: 600
            }
        );
        assert_eq!(
            inspector.status(Some(&token_expiring_in(3600)), 900),
            TokenStatus::Valid {
                seconds_remaining: 3600
            }
        );
        assert_eq!(
            inspector.status(Some(&token_expiring_in(0)), 900),
            TokenStatus::Expired
        );
        assert_eq!(
            inspector.status(Some(&SessionToken::new("x").unwrap()), 900),
            TokenStatus::Malformed
        );
    }

    #[test]
    fn token_status_display_messages() {
        assert_eq!(
            TokenStatus::NotAuthenticated.display_message(),
            "Not authenticated"
        );
        assert!(
            TokenStatus::Valid {
                seconds_remaining: 7200
            }
            .display_message()
            .contains("hours")
        );
        assert!(
            TokenStatus::Expiring {
                seconds_remaining: 30
            }
            .display_message()
            .contains("auto-refresh")
        );
        assert!(TokenStatus::Expiring { seconds_remaining: 5 }.is_valid());
        assert!(!TokenStatus::Expired.is_valid());
    }
}
