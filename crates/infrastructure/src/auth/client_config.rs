//! Client configuration derived from the application's origin.
//!
//! Lookup order:
//! 1. an explicitly provided client key;
//! 2. on `localhost`, the port (`5173` is `admin-ui`, `5174` is `starter`);
//! 3. on a tenant subdomain, the identity service's client registry.
//!
//! Anything unresolved falls back to the configured defaults.

use async_trait::async_trait;
use portcullis_application::ports::ClientConfigResolver;
use portcullis_domain::{ClientConfig, SessionSettings};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::adapters::{ApiClient, ApiError};

const LOCAL_CLIENTS: &[(u16, &str)] = &[(5173, "admin-ui"), (5174, "starter")];

#[derive(Debug, Deserialize)]
struct ClientRows {
    #[serde(default)]
    rows: Vec<ClientRow>,
}

#[derive(Debug, Deserialize)]
struct ClientRow {
    tenant_id: Option<String>,
    client_key: Option<String>,
    #[serde(rename = "Realm")]
    realm: Option<RealmRef>,
    callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RealmRef {
    realm_name: Option<String>,
}

/// Resolves client configuration from the origin the app is served on.
#[derive(Debug, Clone)]
pub struct HostClientConfigResolver {
    api: ApiClient,
    origin: Url,
    default_client_key: String,
    default_realm: String,
    redirect_uri: Option<String>,
    tenant_domain_suffix: String,
}

impl HostClientConfigResolver {
    /// Creates a resolver for `settings.app_origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the origin is not a URL with a host.
    pub fn from_settings(api: ApiClient, settings: &SessionSettings) -> Result<Self, ApiError> {
        let origin = Url::parse(&settings.app_origin)
            .map_err(|e| ApiError::InvalidUrl(format!("{e}: {}", settings.app_origin)))?;
        if origin.host_str().is_none() {
            return Err(ApiError::InvalidUrl(format!(
                "origin has no host: {}",
                settings.app_origin
            )));
        }
        Ok(Self {
            api,
            origin,
            default_client_key: settings.client_key.clone(),
            default_realm: settings.realm.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            tenant_domain_suffix: settings.tenant_domain_suffix.clone(),
        })
    }

    fn host(&self) -> &str {
        self.origin.host_str().unwrap_or_default()
    }

    fn default_redirect(&self) -> String {
        if let Some(uri) = &self.redirect_uri {
            return uri.clone();
        }
        match self.origin.port() {
            Some(port) => format!("{}://{}:{port}/callback", self.origin.scheme(), self.host()),
            None => format!("{}://{}/callback", self.origin.scheme(), self.host()),
        }
    }

    fn local_client_key(&self) -> Option<&'static str> {
        if self.host() != "localhost" {
            return None;
        }
        let port = self.origin.port()?;
        LOCAL_CLIENTS
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, key)| *key)
    }

    fn tenant_id(&self) -> Option<&str> {
        let host = self.host();
        if host == "localhost" || !host.ends_with(&self.tenant_domain_suffix) {
            return None;
        }
        host.split('.').next().filter(|label| !label.is_empty())
    }

    async fn lookup_tenant(&self, tenant_id: &str) -> Result<Option<ClientRow>, ApiError> {
        let mut url = self.api.endpoint(&["auth", "clients"])?;
        url.query_pairs_mut().append_pair("tenant_id", tenant_id);
        let clients: ClientRows = self.api.get_json(url).await?;
        Ok(clients
            .rows
            .into_iter()
            .find(|row| row.tenant_id.as_deref() == Some(tenant_id)))
    }
}

#[async_trait]
impl ClientConfigResolver for HostClientConfigResolver {
    async fn resolve(&self, client_key: Option<&str>) -> ClientConfig {
        let mut config = ClientConfig {
            client_key: self.default_client_key.clone(),
            realm: self.default_realm.clone(),
            tenant_id: None,
            redirect_uri: self.default_redirect(),
        };

        if let Some(key) = client_key {
            debug!(client_key = key, "using provided client key");
            config.client_key = key.to_string();
            return config;
        }

        if let Some(key) = self.local_client_key() {
            debug!(client_key = key, "localhost client detection");
            config.client_key = key.to_string();
        }

        if let Some(tenant_id) = self.tenant_id() {
            config.tenant_id = Some(tenant_id.to_string());
            match self.lookup_tenant(tenant_id).await {
                Ok(Some(row)) => {
                    if let Some(key) = row.client_key {
                        config.client_key = key;
                    }
                    if let Some(realm) = row.realm.and_then(|r| r.realm_name) {
                        config.realm = realm;
                    }
                    if let Some(callback) = row.callback_url {
                        config.redirect_uri = callback;
                    }
                }
                Ok(None) => debug!(tenant_id, "tenant has no registered client"),
                Err(e) => warn!(
                    tenant_id,
                    error = %e,
                    client_key = %config.client_key,
                    "tenant client lookup failed, using existing client key"
                ),
            }
        }

        info!(
            client_key = %config.client_key,
            realm = %config.realm,
            tenant_id = config.tenant_id.as_deref().unwrap_or("-"),
            redirect_uri = %config.redirect_uri,
            "resolved client config"
        );
        config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(api_base: &str, origin: &str) -> HostClientConfigResolver {
        let api = ApiClient::new(api_base, Duration::from_secs(5)).unwrap();
        let settings = SessionSettings {
            app_origin: origin.to_string(),
            ..SessionSettings::default()
        };
        HostClientConfigResolver::from_settings(api, &settings).unwrap()
    }

    #[tokio::test]
    async fn localhost_ports_select_clients() {
        let admin = resolver("http://localhost:4000", "http://localhost:5173")
            .resolve(None)
            .await;
        assert_eq!(admin.client_key, "admin-ui");
        assert_eq!(admin.redirect_uri, "http://localhost:5173/callback");

        let starter = resolver("http://localhost:4000", "http://localhost:5174")
            .resolve(None)
            .await;
        assert_eq!(starter.client_key, "starter");
        assert_eq!(starter.realm, "my-projects");
    }

    #[tokio::test]
    async fn explicit_key_wins_over_port() {
        let config = resolver("http://localhost:4000", "http://localhost:5174")
            .resolve(Some("billing"))
            .await;
        assert_eq!(config.client_key, "billing");
    }

    #[tokio::test]
    async fn unknown_host_uses_defaults() {
        let config = resolver("http://localhost:4000", "https://console.example.org")
            .resolve(None)
            .await;
        assert_eq!(
            config,
            ClientConfig {
                client_key: "admin-ui".to_string(),
                realm: "my-projects".to_string(),
                tenant_id: None,
                redirect_uri: "https://console.example.org/callback".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn tenant_subdomain_consults_client_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/clients"))
            .and(query_param("tenant_id", "acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rows": [
                    { "tenant_id": "other", "client_key": "wrong" },
                    {
                        "tenant_id": "acme",
                        "client_key": "acme-console",
                        "Realm": { "realm_name": "acme-realm" },
                        "callback_url": "https://acme.pms.com/callback"
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = resolver(&server.uri(), "https://acme.pms.com")
            .resolve(None)
            .await;

        assert_eq!(
            config,
            ClientConfig {
                client_key: "acme-console".to_string(),
                realm: "acme-realm".to_string(),
                tenant_id: Some("acme".to_string()),
                redirect_uri: "https://acme.pms.com/callback".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn partial_row_keeps_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/clients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rows": [{ "tenant_id": "acme", "client_key": "acme-console" }]
            })))
            .mount(&server)
            .await;

        let config = resolver(&server.uri(), "http://acme.pms.com:8080")
            .resolve(None)
            .await;

        assert_eq!(config.client_key, "acme-console");
        assert_eq!(config.realm, "my-projects");
        assert_eq!(config.redirect_uri, "http://acme.pms.com:8080/callback");
    }

    #[tokio::test]
    async fn failed_lookup_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/clients"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = resolver(&server.uri(), "https://acme.pms.com")
            .resolve(None)
            .await;

        assert_eq!(config.client_key, "admin-ui");
        assert_eq!(config.tenant_id.as_deref(), Some("acme"));
    }

    #[test]
    fn origin_without_host_is_rejected() {
        let api = ApiClient::new("http://localhost:4000", Duration::from_secs(5)).unwrap();
        let settings = SessionSettings {
            app_origin: "mailto:someone@example.com".to_string(),
            ..SessionSettings::default()
        };
        assert!(HostClientConfigResolver::from_settings(api, &settings).is_err());
    }
}
