//! Fake collaborators shared by the auth unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use portcullis_domain::{AuthError, AuthResult, SessionToken, encode_unsigned};
use tokio::sync::Notify;

use crate::ports::{AuthorizationHeader, Clock, RefreshClient, SessionStorage, StorageError};

/// Fixed "now" used across tests: 2023-11-14T22:13:20Z.
pub const NOW_SECS: i64 = 1_700_000_000;

/// Unsigned token expiring `offset_secs` after [`NOW_SECS`].
pub fn token_expiring_in(offset_secs: i64) -> SessionToken {
    token_with_exp(NOW_SECS + offset_secs, "alice")
}

pub fn token_with_exp(exp: i64, sub: &str) -> SessionToken {
    SessionToken::new(encode_unsigned(&serde_json::json!({ "exp": exp, "sub": sub }))).unwrap()
}

#[derive(Debug)]
pub struct FixedClock {
    millis: Mutex<i64>,
}

impl FixedClock {
    pub fn at_secs(secs: i64) -> Self {
        Self {
            millis: Mutex::new(secs * 1000),
        }
    }

    pub fn set_millis(&self, millis: i64) {
        *self.millis.lock() = millis;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at_secs(NOW_SECS)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(*self.millis.lock()).unwrap()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    rejected_key: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Makes writes to `key` fail until [`MemoryStorage::accept_writes`].
    pub fn reject_writes_to(&self, key: &str) {
        *self.rejected_key.lock() = Some(key.to_string());
    }

    pub fn accept_writes(&self) {
        self.rejected_key.lock().take();
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.rejected_key.lock().as_deref() == Some(key) {
            return Err(StorageError::Unavailable(format!("writes to {key} rejected")));
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Storage whose every call fails.
#[derive(Debug, Default)]
pub struct BrokenStorage;

impl SessionStorage for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("broken".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("broken".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("broken".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct RecordingHeader {
    value: Mutex<Option<String>>,
}

impl RecordingHeader {
    pub fn current(&self) -> Option<String> {
        self.value.lock().clone()
    }
}

impl AuthorizationHeader for RecordingHeader {
    fn set_bearer(&self, token: &SessionToken) {
        *self.value.lock() = Some(token.bearer_header());
    }

    fn clear(&self) {
        *self.value.lock() = None;
    }
}

/// Refresh client that answers from a script and counts calls.
///
/// With a gate installed, `refresh` parks until the gate is opened.
#[derive(Default)]
pub struct ScriptedRefreshClient {
    responses: Mutex<Vec<AuthResult<SessionToken>>>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    fail_logout: bool,
    gate: Option<Arc<Notify>>,
}

impl ScriptedRefreshClient {
    pub fn returning(responses: Vec<AuthResult<SessionToken>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn failing_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_count(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshClient for ScriptedRefreshClient {
    async fn refresh(&self, _client_key: &str) -> AuthResult<SessionToken> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .pop()
            .unwrap_or_else(|| Err(AuthError::RefreshFailed("no scripted response".to_string())))
    }

    async fn logout(&self, _client_key: &str) -> AuthResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout {
            return Err(AuthError::RefreshFailed("logout rejected".to_string()));
        }
        Ok(())
    }
}
