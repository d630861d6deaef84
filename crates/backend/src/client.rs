//! HTTP plumbing shared by every endpoint.
//!
//! All calls that carry a bearer token go through
//! [`BackendClient::send_authorized`]: on `401 Unauthorized` it refreshes the
//! access token once and replays the request once.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Credentials;
use crate::cache::{CacheKey, CacheValue};
use crate::error::BackendError;

/// Catalog cache lifetime.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Origin of the REST API, e.g. `http://localhost:8080`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Client for the commerce backend REST API.
///
/// Cheap to clone. Category and banner lists are cached for 5 minutes.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("Shopbag/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }

    /// Absolute URL for an API path such as `/api/carts`.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(Url::parse(&format!("{}{path}", self.inner.base_url))?)
    }

    /// Send an unauthenticated request and return the body of a success.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        self.finish(response).await
    }

    /// Send a request with the visitor's bearer token.
    ///
    /// `build` is called once per attempt, so request bodies (including
    /// multipart forms) are rebuilt for the retry.
    pub(crate) async fn send_authorized<F>(
        &self,
        credentials: &Credentials,
        build: F,
    ) -> Result<String, BackendError>
    where
        F: Fn(&reqwest::Client) -> Result<RequestBuilder, BackendError>,
    {
        let token = credentials.access_token().await?;
        let response = build(self.http())?.bearer_auth(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return self.finish(response).await;
        }

        tracing::debug!("Access token rejected, refreshing before retry");
        let fresh = self.refresh(credentials, &token).await?;
        let response = build(self.http())?.bearer_auth(&fresh).send().await?;
        self.finish(response).await
    }

    /// Check the status and read the body.
    pub(crate) async fn finish(&self, response: Response) -> Result<String, BackendError> {
        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let text = response.text().await?;

        if !status.is_success() {
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %text.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            } else {
                tracing::debug!(status = %status, "Backend rejected request");
            }
            return Err(BackendError::from_status(status, &text, retry_after));
        }

        Ok(text)
    }

    /// Parse a JSON body, logging the start of it on failure.
    pub(crate) fn parse<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, BackendError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend {what} response"
            );
            BackendError::Parse(e)
        })
    }

    /// Check that the backend answers at all.
    ///
    /// # Errors
    ///
    /// Returns the transport or status error of a category list request.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = self.endpoint("/api/categories")?;
        self.send(self.http().get(url)).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let c = client("http://localhost:8080/");
        assert_eq!(
            c.endpoint("/api/carts").unwrap().as_str(),
            "http://localhost:8080/api/carts"
        );
    }

    #[test]
    fn test_parse_reports_json_errors() {
        let result: Result<Vec<i64>, _> = BackendClient::parse("{oops", "test");
        assert!(matches!(result, Err(BackendError::Parse(_))));
    }
}
