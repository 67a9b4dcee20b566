//! Token refresh and logout over HTTP.

use async_trait::async_trait;
use portcullis_application::ports::RefreshClient;
use portcullis_domain::{AuthError, AuthResult, SessionToken};
use serde::Deserialize;
use tracing::debug;

use crate::adapters::{ApiClient, ApiError};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// [`RefreshClient`] backed by the identity service's cookie session.
#[derive(Debug, Clone)]
pub struct HttpRefreshClient {
    api: ApiClient,
}

impl HttpRefreshClient {
    /// Creates a refresh client sharing `api`'s cookie jar.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

fn refresh_failed(e: ApiError) -> AuthError {
    AuthError::RefreshFailed(e.to_string())
}

#[async_trait]
impl RefreshClient for HttpRefreshClient {
    async fn refresh(&self, client_key: &str) -> AuthResult<SessionToken> {
        let url = self
            .api
            .endpoint(&["auth", "refresh", client_key])
            .map_err(refresh_failed)?;
        debug!(client_key, "requesting token refresh");

        let response = self.api.post_with_cookies(url).await.map_err(refresh_failed)?;
        let body: RefreshResponse = ApiClient::read_json(response)
            .await
            .map_err(refresh_failed)?;

        SessionToken::new(body.access_token).map_err(|_| {
            AuthError::RefreshFailed("refresh response carried an empty access token".to_string())
        })
    }

    async fn logout(&self, client_key: &str) -> AuthResult<()> {
        let url = self
            .api
            .endpoint(&["logout", client_key])
            .map_err(refresh_failed)?;
        self.api.post_empty(url).await.map_err(refresh_failed)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use portcullis_application::ports::AuthorizationHeader;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn refresh_client(server: &MockServer) -> (HttpRefreshClient, ApiClient) {
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        (HttpRefreshClient::new(api.clone()), api)
    }

    #[tokio::test]
    async fn refresh_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/admin-ui"))
            .and(body_string(""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "new.jwt.token" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        let (client, _) = refresh_client(&server);

        let token = client.refresh("admin-ui").await.unwrap();

        assert_eq!(token.as_str(), "new.jwt.token");
    }

    #[tokio::test]
    async fn refresh_sends_no_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/admin-ui"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "t" })),
            )
            .mount(&server)
            .await;
        let (client, api) = refresh_client(&server);
        api.set_bearer(&SessionToken::new("old").unwrap());

        client.refresh("admin-ui").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn rejected_refresh_is_refresh_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/admin-ui"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let (client, _) = refresh_client(&server);

        let result = client.refresh("admin-ui").await;
        assert!(matches!(result, Err(AuthError::RefreshFailed(_))));
    }

    #[tokio::test]
    async fn missing_access_token_is_refresh_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/admin-ui"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        let (client, _) = refresh_client(&server);

        assert!(matches!(
            client.refresh("admin-ui").await,
            Err(AuthError::RefreshFailed(_))
        ));
    }

    #[tokio::test]
    async fn empty_access_token_is_refresh_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/admin-ui"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "" })),
            )
            .mount(&server)
            .await;
        let (client, _) = refresh_client(&server);

        assert!(matches!(
            client.refresh("admin-ui").await,
            Err(AuthError::RefreshFailed(_))
        ));
    }

    #[tokio::test]
    async fn logout_posts_to_client_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logout/starter"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let (client, _) = refresh_client(&server);

        client.logout("starter").await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_is_refresh_failed() {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let client = HttpRefreshClient::new(api);
        assert!(matches!(
            client.refresh("admin-ui").await,
            Err(AuthError::RefreshFailed(_))
        ));
    }
}
