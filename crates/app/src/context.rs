//! Wiring of the session components.

use std::sync::Arc;

use portcullis_application::ports::{ClientConfigResolver, SessionStorage};
use portcullis_application::{RedirectAuthFlow, SessionManager, TokenInspector, TokenStore};
use portcullis_domain::SessionSettings;
use portcullis_infrastructure::{
    ApiClient, HostClientConfigResolver, HttpRefreshClient, SystemClock,
};
use tracing::debug;

use crate::error::AppResult;

/// Everything a command needs, built once per process.
#[derive(Debug)]
pub struct AppContext {
    /// Effective settings.
    pub settings: SessionSettings,
    /// Shared HTTP client carrying the bearer header and cookies.
    pub api: ApiClient,
    /// Session lifecycle manager.
    pub manager: Arc<SessionManager>,
    /// Login/callback exchange.
    pub flow: RedirectAuthFlow,
}

impl AppContext {
    /// Builds the component graph on top of `storage`.
    ///
    /// The refresh and logout client key is resolved from the app origin
    /// once, here.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL is invalid or the HTTP client
    /// cannot be created.
    pub async fn build(
        settings: SessionSettings,
        storage: Arc<dyn SessionStorage>,
    ) -> AppResult<Self> {
        let api = ApiClient::new(settings.api_base_url(), settings.request_timeout())?;
        let resolver = Arc::new(HostClientConfigResolver::from_settings(
            api.clone(),
            &settings,
        )?);
        let client = resolver.resolve(None).await;
        debug!(client_key = %client.client_key, "session client resolved");

        let store = TokenStore::new(storage, Arc::new(api.clone()));
        let inspector = TokenInspector::new(Arc::new(SystemClock::new()));
        let refresh_client = Arc::new(HttpRefreshClient::new(api.clone()));
        let manager = Arc::new(
            SessionManager::new(store, inspector, refresh_client, client.client_key)
                .with_refresh_threshold(settings.refresh_threshold()),
        );

        let flow = RedirectAuthFlow::new(
            Arc::clone(&manager),
            resolver,
            settings.auth_base_url.clone(),
        )
        .with_require_state(settings.require_state);

        Ok(Self {
            settings,
            api,
            manager,
            flow,
        })
    }
}
