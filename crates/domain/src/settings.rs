//! Session Settings Domain Model
//!
//! Defines how the session lifecycle talks to the identity service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the session lifecycle manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Base URL of the centralized authorization service.
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    /// Base URL of the management API. Falls back to `auth_base_url`.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Client key used when nothing more specific is resolved.
    #[serde(default = "default_client_key")]
    pub client_key: String,

    /// Realm used when the client lookup does not name one.
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Redirect target after login. Derived from `app_origin` when absent.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Origin the application is served from; drives client resolution.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// Seconds between background expiry checks.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Refresh once the remaining lifetime drops below this many seconds.
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,

    /// Timeout applied to every outbound request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Host suffix that marks tenant subdomains.
    #[serde(default = "default_tenant_domain_suffix")]
    pub tenant_domain_suffix: String,

    /// Reject callbacks whose `state` does not match the persisted one.
    #[serde(default = "default_require_state")]
    pub require_state: bool,
}

fn default_auth_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_client_key() -> String {
    "admin-ui".to_string()
}

fn default_realm() -> String {
    "my-projects".to_string()
}

fn default_app_origin() -> String {
    "http://localhost:5173".to_string()
}

const fn default_refresh_interval_secs() -> u64 {
    60
}

const fn default_refresh_threshold_secs() -> u64 {
    15 * 60
}

const fn default_request_timeout_secs() -> u64 {
    30
}

fn default_tenant_domain_suffix() -> String {
    ".pms.com".to_string()
}

const fn default_require_state() -> bool {
    true
}

impl SessionSettings {
    /// Base URL for management API calls.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(&self.auth_base_url)
    }

    /// Interval between background expiry checks.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Remaining-lifetime threshold that triggers a refresh.
    #[must_use]
    pub const fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }

    /// Timeout for outbound requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auth_base_url: default_auth_base_url(),
            api_base_url: None,
            client_key: default_client_key(),
            realm: default_realm(),
            redirect_uri: None,
            app_origin: default_app_origin(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            tenant_domain_suffix: default_tenant_domain_suffix(),
            require_state: default_require_state(),
        }
    }
}
