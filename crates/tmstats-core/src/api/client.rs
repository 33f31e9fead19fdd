//! API client for the game statistics REST API.
//!
//! This module provides the `ApiClient` struct: one GET per resource or
//! options endpoint, JSON in, typed payload out. It performs no retries
//! and no caching; both are the caller's concern.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{
    AwardStats, CardMode, CardStats, CorporationStats, FilterOptions, MilestoneStats, PreludeStats,
};

use super::{ApiError, Resource};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the statistics API
pub const DEFAULT_API_BASE_URL: &str = "https://api.tmstats.net";

/// HTTP request timeout in seconds.
/// Collections can be a few megabytes, so this is generous.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the statistics service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET `path` relative to the base URL and parse the body as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        let text = response
            .text()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Failed to read response body from {}", url))?;
        debug!(url = %url, bytes = text.len(), "Response received");

        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Data Fetching Methods =====

    pub async fn fetch_corporations(&self) -> Result<Vec<CorporationStats>> {
        self.get_json(&Resource::Corporation.collection_path(None))
            .await
    }

    pub async fn fetch_cards(&self, mode: CardMode) -> Result<Vec<CardStats>> {
        self.get_json(&Resource::Card.collection_path(Some(mode)))
            .await
    }

    pub async fn fetch_preludes(&self) -> Result<Vec<PreludeStats>> {
        self.get_json(&Resource::Prelude.collection_path(None)).await
    }

    pub async fn fetch_awards(&self) -> Result<Vec<AwardStats>> {
        self.get_json(&Resource::Award.collection_path(None)).await
    }

    pub async fn fetch_milestones(&self) -> Result<Vec<MilestoneStats>> {
        self.get_json(&Resource::Milestone.collection_path(None))
            .await
    }

    /// Fetch the filter options payload for any resource
    pub async fn fetch_options(&self, resource: Resource) -> Result<FilterOptions> {
        self.get_json(&resource.options_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("https://stats.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://stats.example.com");
        assert_eq!(
            client.url("/api/corporations"),
            "https://stats.example.com/api/corporations"
        );
        assert_eq!(
            client.url("api/awards/options"),
            "https://stats.example.com/api/awards/options"
        );
    }

    #[tokio::test]
    async fn test_unsendable_request_is_a_network_error() {
        // Not a URL, so the request fails before any connection is attempted
        let client = ApiClient::new("tmstats offline").unwrap();
        let err = client.fetch_corporations().await.unwrap_err();
        assert!(err.to_string().contains("Failed to send GET request"));
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NetworkError(_))
        ));
    }

    #[test]
    fn test_auth_headers() {
        let client = ApiClient::new(DEFAULT_API_BASE_URL).unwrap();
        let headers = client.auth_headers().unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());

        let authed = client.with_token("secret".to_string());
        let headers = authed.auth_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer secret"
        );
        assert_eq!(authed.base_url(), client.base_url());
    }
}
