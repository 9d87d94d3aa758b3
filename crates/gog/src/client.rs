//! REST client for the GOG backend services.
//!
//! Wraps the handful of GOG HTTP APIs the client talks to (library
//! registry, GamesDB, storefront, reviews, presence, user info) using
//! [`reqwest`]. One client instance covers all services; per-service
//! base URLs come from [`Endpoints`].

use std::collections::HashMap;

use reqwest::header;
use reqwest::StatusCode;
use serde_json::Value;

use crate::auth::Credentials;
use crate::endpoints::Endpoints;
use crate::models::{GamesDbRecord, RegistryPage, RegistryResponse, ReviewScore, StoreProduct};

/// Version string GOG's presence service expects from a Galaxy client.
pub const CLIENT_VERSION: &str = "2.0.45.61";

/// HTTP client for the GOG backend services.
pub struct GogApi {
    client: reqwest::Client,
    endpoints: Endpoints,
}

/// Errors from the GOG REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GOG returned a non-2xx status code.
    #[error("GOG API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl GogApi {
    /// Create a new API client for the given set of service endpoints.
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful when the caller configures timeouts or pooling).
    pub fn with_client(client: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// Fetch the user's release registry, revalidating against a cached
    /// ETag.
    ///
    /// Sends a conditional `GET /users/{user_id}/releases`. A `304 Not
    /// Modified` answer yields [`RegistryResponse::NotModified`]; a `200`
    /// yields the full entry list together with the new ETag.
    pub async fn fetch_releases(
        &self,
        credentials: &Credentials,
        etag: Option<&str>,
    ) -> Result<RegistryResponse, ApiError> {
        let mut request = self
            .client
            .get(format!(
                "{}/users/{}/releases",
                self.endpoints.library, credentials.user_id
            ))
            .bearer_auth(&credentials.access_token);
        if let Some(etag) = etag {
            request = request.header(header::IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(RegistryResponse::NotModified);
        }

        let response = Self::ensure_success(response).await?;
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let page: RegistryPage = response.json().await?;
        Ok(RegistryResponse::Fresh {
            items: page.items,
            etag,
        })
    }

    /// Fetch the GamesDB record for one external release.
    ///
    /// Sends a `GET /platforms/{platform_id}/external_releases/{external_id}`
    /// request. Non-GOG releases need the per-entry library certificate,
    /// passed as the `X-GOG-Library-Cert` header.
    pub async fn games_db(
        &self,
        platform_id: &str,
        external_id: &str,
        certificate: Option<&str>,
    ) -> Result<GamesDbRecord, ApiError> {
        let mut request = self.client.get(format!(
            "{}/platforms/{}/external_releases/{}",
            self.endpoints.gamesdb, platform_id, external_id
        ));
        if let Some(certificate) = certificate {
            request = request.header("X-GOG-Library-Cert", certificate);
        }

        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// Fetch the storefront document for a GOG product.
    ///
    /// Sends a `GET /v2/games/{external_id}` request. `nonComplete=1`
    /// asks the store to answer for unreleased products too.
    pub async fn store_product(&self, external_id: &str) -> Result<StoreProduct, ApiError> {
        let response = self
            .client
            .get(format!("{}/v2/games/{}", self.endpoints.store, external_id))
            .query(&[("nonComplete", "1")])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the average user review score for a GOG product.
    pub async fn review_score(&self, external_id: &str) -> Result<ReviewScore, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/products/{}/averageRating",
                self.endpoints.reviews, external_id
            ))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Publish the user's presence ("online", "invisible", ...) to GOG.
    pub async fn set_presence(
        &self,
        credentials: &Credentials,
        status: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "application_type": "GOG Galaxy",
            "force_update": false,
            "presence": status,
            "version": CLIENT_VERSION,
        });

        let response = self
            .client
            .post(format!(
                "{}/users/{}/status",
                self.endpoints.presence, credentials.user_id
            ))
            .bearer_auth(&credentials.access_token)
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Clear the user's presence, marking them offline.
    pub async fn delete_presence(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!(
                "{}/users/{}/status",
                self.endpoints.presence, credentials.user_id
            ))
            .bearer_auth(&credentials.access_token)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Fetch the logged-in user's profile document.
    pub async fn user_info(&self, credentials: &Credentials) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/users/{}",
                self.endpoints.users, credentials.user_id
            ))
            .bearer_auth(&credentials.access_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Proxy an arbitrary GET under the main API host.
    ///
    /// Used for the embedded UI's passthrough requests. Unlike the typed
    /// calls above, a non-2xx answer is not an error here: the status code
    /// is part of the result so the caller can relay it verbatim. Bodies
    /// that are not JSON come back as [`Value::Null`].
    pub async fn fetch_raw(
        &self,
        path: &str,
        params: &HashMap<String, String>,
    ) -> Result<(u16, Value), ApiError> {
        let response = self
            .client
            .get(format!("{}/{}", self.endpoints.api, path))
            .query(params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
