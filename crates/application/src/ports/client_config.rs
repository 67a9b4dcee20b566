//! Client configuration lookup port

use async_trait::async_trait;
use portcullis_domain::ClientConfig;

/// Resolves which client key, realm and redirect target a login uses.
#[async_trait]
pub trait ClientConfigResolver: Send + Sync {
    /// Resolves the effective configuration.
    ///
    /// An explicitly provided `client_key` always wins. Lookups never fail;
    /// implementations fall back to their defaults and log.
    async fn resolve(&self, client_key: Option<&str>) -> ClientConfig;
}

/// Resolver that always answers with the same configuration.
#[derive(Debug, Clone)]
pub struct FixedClientConfig {
    config: ClientConfig,
}

impl FixedClientConfig {
    /// Creates a resolver returning `config`.
    #[must_use]
    pub const fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClientConfigResolver for FixedClientConfig {
    async fn resolve(&self, client_key: Option<&str>) -> ClientConfig {
        let mut config = self.config.clone();
        if let Some(key) = client_key {
            config.client_key = key.to_string();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            client_key: "admin-ui".to_string(),
            realm: "my-projects".to_string(),
            tenant_id: None,
            redirect_uri: "http://localhost:5173/callback".to_string(),
        }
    }

    #[tokio::test]
    async fn explicit_key_wins() {
        let resolver = FixedClientConfig::new(config());
        assert_eq!(resolver.resolve(None).await.client_key, "admin-ui");
        assert_eq!(resolver.resolve(Some("starter")).await.client_key, "starter");
    }
}
