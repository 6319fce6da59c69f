//! HTTP client for the Pantry Palace REST service.
//!
//! # Architecture
//!
//! - The remote service is the source of truth for carts and products; this
//!   client holds no state beyond connection settings.
//! - Every request that needs identity carries `Authorization: Bearer <token>`.
//! - Non-success responses become [`ApiError`] values carrying the server's
//!   `message` verbatim, falling back to a description of the request.
//!
//! Endpoints are split by resource. `cart` implements
//! [`CartGateway`](crate::cart::CartGateway), `products` holds the catalog
//! and admin calls, and `auth` holds login and registration.

mod auth;
mod cart;
mod products;
mod types;

pub use auth::Credentials;

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::config::PantryConfig;
use crate::error::{ApiError, LOGIN_REQUIRED_MESSAGE};
use crate::session::AuthToken;

use types::MessageResponse;

/// Client for the REST service.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. the TLS
    /// backend fails to initialize).
    pub fn new(config: &PantryConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("pantry/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// The normalized base URL (always ending in `/api`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        // http(s) URLs are never cannot-be-a-base, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, segments: &[&str]) -> RequestBuilder {
        self.inner.client.get(self.endpoint(segments))
    }

    fn post(&self, segments: &[&str]) -> RequestBuilder {
        self.inner.client.post(self.endpoint(segments))
    }

    fn put(&self, segments: &[&str]) -> RequestBuilder {
        self.inner.client.put(self.endpoint(segments))
    }

    fn delete(&self, segments: &[&str]) -> RequestBuilder {
        self.inner.client.delete(self.endpoint(segments))
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ApiError> {
        let body = Self::send(request, context).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse response body"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose success body is irrelevant.
    async fn send_empty(request: RequestBuilder, context: &str) -> Result<(), ApiError> {
        Self::send(request, context).await.map(drop)
    }

    async fn send(request: RequestBuilder, context: &str) -> Result<String, ApiError> {
        let response = request.send().await?;
        Self::check(response, context).await
    }

    /// Map the status to an error, or return the body text on success.
    async fn check(response: Response, context: &str) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            debug!(status = %status, "Request succeeded");
            return Ok(body);
        }

        let server_message = serde_json::from_str::<MessageResponse>(&body)
            .ok()
            .and_then(|m| m.message)
            .filter(|m| !m.trim().is_empty());

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!(status = %status, "Request requires login");
            return Err(ApiError::Unauthorized(
                server_message.unwrap_or_else(|| LOGIN_REQUIRED_MESSAGE.to_string()),
            ));
        }

        error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Service returned non-success status"
        );
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: server_message.unwrap_or_else(|| context.to_string()),
        })
    }
}

/// Attach the bearer token when one is present.
fn with_token(request: RequestBuilder, token: Option<&AuthToken>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token.expose()),
        None => request,
    }
}
