//! HTTP client for the EatHub REST API.
//!
//! Uses `reqwest` with a fixed per-request timeout. Every request carries
//! `Authorization: Bearer <token>` when the configured [`TokenProvider`] has a
//! session, and every failure is normalized into [`ApiError`] so callers can
//! branch on `status`/`code` without caring whether the server answered.
//!
//! Response bodies are unwrapped uniformly: `{ "data": T }` and bare `T`
//! both decode to `T`.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;

/// Code for failures where no response was received.
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";

/// Code for failures raised on our side (bad URL, undecodable body).
pub const CLIENT_ERROR: &str = "CLIENT_ERROR";

/// Header carrying a client-generated key for retried mutations.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

const BODY_LOG_LIMIT: usize = 500;

/// Source of the bearer token attached to outgoing requests.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<SecretString>;
}

/// Normalized API failure.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable message, from the server when it sent one.
    pub message: String,
    /// Server error code, [`NETWORK_ERROR`], [`CLIENT_ERROR`] or `HTTP_<status>`.
    pub code: String,
    /// HTTP status, absent when no response was received.
    pub status: Option<u16>,
    /// Error response body, when there was one.
    pub data: Option<Value>,
}

/// `{ "error": { "message": ..., "code": ... } }`
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl ApiError {
    /// A failure where no response was received.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: NETWORK_ERROR.to_string(),
            status: None,
            data: None,
        }
    }

    /// A failure raised on the client side.
    #[must_use]
    pub fn client(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            message: message.into(),
            code: CLIENT_ERROR.to_string(),
            status,
            data: None,
        }
    }

    /// Build from an error response.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let data = serde_json::from_str::<Value>(body).ok();
        let parsed = data
            .as_ref()
            .and_then(|v| serde_json::from_value::<ErrorEnvelope>(v.clone()).ok());
        let (message, code) = parsed.map_or((None, None), |e| (e.error.message, e.error.code));
        let message = message
            .or_else(|| {
                // Some endpoints answer `{ "message": "..." }`
                data.as_ref()
                    .and_then(|v| v.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

        Self {
            message,
            code: code.unwrap_or_else(|| format!("HTTP_{}", status.as_u16())),
            status: Some(status.as_u16()),
            data: data.or_else(|| (!body.is_empty()).then(|| Value::String(truncate(body)))),
        }
    }

    /// No response was received (connection failure or timeout).
    #[must_use]
    pub fn is_network(&self) -> bool {
        self.code == NETWORK_ERROR
    }

    /// The server answered with 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s >= 500)
    }

    /// The server answered with 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_some_and(|s| (400..500).contains(&s))
    }

    /// The server answered 401 or 403.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status, Some(401 | 403))
    }

    /// The server answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Default retry predicate: network errors, timeouts and 5xx.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_network() || self.is_server_error()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            return Self::client(e.to_string(), None);
        }
        if e.is_decode() {
            return Self::client(e.to_string(), e.status().map(|s| s.as_u16()));
        }
        if e.is_timeout() {
            return Self::network("Request timed out - please try again");
        }
        Self::network(format!(
            "Network error - please check your connection ({e})"
        ))
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(BODY_LOG_LIMIT).collect()
}

/// Unwrap `{ "data": T }` to `T`; anything else is returned as is.
///
/// A `data` member that is `null` does not count as an envelope.
#[must_use]
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(null) => {
                map.insert("data".to_string(), null);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the EatHub REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        tokens: Option<Arc<dyn TokenProvider>>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                tokens,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::client(format!("Invalid request path {path}: {e}"), None))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match self.inner.tokens.as_ref().and_then(|t| t.bearer_token()) {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// `GET path?query`.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`ApiError`] on any failure.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        self.send(Method::GET, self.request(Method::GET, url)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`ApiError`] on any failure.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(Method::POST, self.request(Method::POST, url).json(body))
            .await
    }

    /// `POST path` with a JSON body and an [`IDEMPOTENCY_KEY_HEADER`].
    ///
    /// Retries of the same logical mutation must reuse `key`.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`ApiError`] on any failure.
    pub async fn post_idempotent<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        key: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        let builder = self
            .request(Method::POST, url)
            .header(IDEMPOTENCY_KEY_HEADER, key)
            .json(body);
        self.send(Method::POST, builder).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`ApiError`] on any failure.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(Method::PUT, self.request(Method::PUT, url).json(body))
            .await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`ApiError`] on any failure.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(Method::PATCH, self.request(Method::PATCH, url).json(body))
            .await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// Returns a normalized [`ApiError`] on any failure.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.send(Method::DELETE, self.request(Method::DELETE, url))
            .await
    }

    #[instrument(skip(self, builder), fields(method = %method))]
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            let error = ApiError::from_response(status, &body);
            debug!(
                %url,
                status = status.as_u16(),
                code = %error.code,
                "EatHub API returned non-success status"
            );
            return Err(error);
        }

        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| {
                tracing::error!(
                    %url,
                    error = %e,
                    body = %truncate(&body),
                    "Failed to parse EatHub API response"
                );
                ApiError::client(format!("Invalid JSON response: {e}"), Some(status.as_u16()))
            })?
        };

        serde_json::from_value(unwrap_envelope(value)).map_err(|e| {
            tracing::error!(%url, error = %e, "EatHub API response has an unexpected shape");
            ApiError::client(
                format!("Unexpected response shape: {e}"),
                Some(status.as_u16()),
            )
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.tokens.is_some())
            .finish()
    }
}
