//! Shared HTTP client for the identity and management APIs.
//!
//! One `reqwest::Client` carries the ambient session: a cookie jar for the
//! server-side refresh cookie and a bearer slot mirrored from the token
//! store. Clones share both.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use portcullis_application::ports::AuthorizationHeader;
use portcullis_domain::SessionToken;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Errors from API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server rejected the credentials (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The response body did not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Any other client error.
    #[error("HTTP client error: {0}")]
    Other(String),
}

/// HTTP client with a base URL, cookie jar and bearer slot.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
    bearer: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    ///
    /// Default configuration:
    /// - Cookie store: enabled
    /// - Redirects: not followed
    /// - User-Agent: "Portcullis/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL or the client
    /// cannot be created.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{e}: {base_url}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "cannot be a base: {base_url}"
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("Portcullis/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
            bearer: Arc::new(RwLock::new(None)),
        })
    }

    /// The base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `Authorization` value currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.bearer.read().clone()
    }

    /// Appends path segments to the base URL. Segments are percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(format!("cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET` with the ambient bearer header, decoding a JSON body.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] on 401, [`ApiError::Status`] on other
    /// failures, [`ApiError::Decode`] if the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.send(self.authorized(Method::GET, url)).await?;
        Self::read_json(response).await
    }

    /// `POST` with no body and the ambient bearer header.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get_json`], without the decode step.
    pub async fn post_empty(&self, url: Url) -> Result<Response, ApiError> {
        self.send(self.authorized(Method::POST, url)).await
    }

    /// `POST` with no body, credentialed by the cookie jar only.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::post_empty`].
    pub async fn post_with_cookies(&self, url: Url) -> Result<Response, ApiError> {
        self.send(self.client.request(Method::POST, url)).await
    }

    /// Profile of the signed-in user (`GET /auth/me`).
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] when the token is missing or rejected.
    pub async fn current_user(&self) -> Result<serde_json::Value, ApiError> {
        let url = self.endpoint(&["auth", "me"])?;
        self.get_json(url).await
    }

    /// Decodes a JSON response body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if the body is not valid JSON for `T`.
    pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.bearer.read().as_deref() {
            Some(value) => builder.header(AUTHORIZATION, value),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn map_error(&self, error: &reqwest::Error) -> ApiError {
        if error.is_timeout() {
            return ApiError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        if error.is_connect() {
            return ApiError::ConnectionFailed(error.to_string());
        }
        ApiError::Other(error.to_string())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("bearer", &self.bearer.read().is_some())
            .finish_non_exhaustive()
    }
}

impl AuthorizationHeader for ApiClient {
    fn set_bearer(&self, token: &SessionToken) {
        *self.bearer.write() = Some(token.bearer_header());
    }

    fn clear(&self) {
        *self.bearer.write() = None;
    }
}
