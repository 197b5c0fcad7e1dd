//! HTTP fetcher implementation
//!
//! This module handles all requests to the REST API, including:
//! - Building HTTP clients with the configured cookie, headers and timeout
//! - Issuing method calls with the credentials every call carries
//! - Fetching one listing page and classifying the outcome
//!
//! Fetchers never retry on their own; a failed page is reported and the
//! dispatcher decides what happens next.

use crate::config::ApiConfig;
use crate::crawler::parser::{extract_media, parse_response, ApiResponse};
use crate::model::{CrawlTarget, MediaRecord};
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::Client;
use std::time::Duration;

/// Result of fetching one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was retrieved and parsed
    Success {
        /// One record per listed item
        records: Vec<MediaRecord>,
    },

    /// The API answered but reported a failure; retryable
    RemoteError {
        /// The API's failure message
        message: String,
    },

    /// Network, timeout or decoding failure; retryable
    TransportError {
        /// Error description
        cause: String,
    },
}

/// Fetches one page of a listing
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, target: &CrawlTarget, page: u32) -> FetchOutcome;
}

/// Failure of a single API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Non-OK status, either HTTP or `stat`
    Remote(String),
    /// The call did not produce a readable response
    Transport(String),
}

impl CallError {
    /// Converts the failure into a session-level error for `operation`
    pub fn into_harvest_error(self, operation: &str) -> HarvestError {
        match self {
            Self::Remote(message) => HarvestError::Remote {
                operation: operation.to_string(),
                message,
            },
            Self::Transport(cause) => HarvestError::Transport {
                operation: operation.to_string(),
                cause,
            },
        }
    }
}

/// Builds an HTTP client with the configured cookie, headers and timeout
///
/// # Arguments
///
/// * `config` - The API configuration
/// * `timeout` - Upper bound on each request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - A header was malformed or the client failed to build
pub fn build_http_client(config: &ApiConfig, timeout: Duration) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();

    if let Some(cookie) = &config.cookie {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| ConfigError::Validation(format!("Invalid cookie: {}", e)))?;
        headers.insert(COOKIE, value);
    }

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::Validation(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ConfigError::Validation(format!("Invalid value for header '{}': {}", name, e)))?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Issues REST method calls with the configured credentials
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
    csrf: String,
    api_key: String,
}

impl ApiClient {
    /// Creates a client from the API configuration
    pub fn new(config: &ApiConfig, timeout: Duration) -> Result<Self, HarvestError> {
        Ok(Self::with_client(build_http_client(config, timeout)?, config))
    }

    /// Creates a client around an existing HTTP client
    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            csrf: config.csrf.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Calls `method` with `params` and returns the parsed OK response
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | HTTP status not 2xx | `Remote("HTTP <code>")` |
    /// | `stat` not `ok` | `Remote(<message>)` |
    /// | Connect failure, timeout | `Transport` |
    /// | Body is not a valid response | `Transport` |
    pub async fn call(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<ApiResponse, CallError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .query(&[
                ("method", method),
                ("csrf", self.csrf.as_str()),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("nojsoncallback", "1"),
            ])
            .send()
            .await
            .map_err(|e| CallError::Transport(describe_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallError::Remote(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CallError::Transport(describe_error(&e)))?;

        let parsed = parse_response(&body)
            .map_err(|e| CallError::Transport(format!("Invalid response body: {}", e)))?;

        if !parsed.is_ok() {
            return Err(CallError::Remote(parsed.failure_message()));
        }

        Ok(parsed)
    }
}

/// Classifies a reqwest error into a short description
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else if error.is_decode() || error.is_body() {
        format!("Failed to read response body: {}", error)
    } else {
        error.to_string()
    }
}

/// Fetches listing pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    api: ApiClient,
    page_size: u32,
    media_base_url: String,
}

impl HttpFetcher {
    pub fn new(api: ApiClient, page_size: u32, media_base_url: impl Into<String>) -> Self {
        Self {
            api,
            page_size,
            media_base_url: media_base_url.into(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, target: &CrawlTarget, page: u32) -> FetchOutcome {
        let params = [
            ("per_page", self.page_size.to_string()),
            ("page", page.to_string()),
            ("user_id", target.user_id.clone()),
        ];

        match self.api.call(target.mode.api_method(), &params).await {
            Ok(response) => match extract_media(response, &self.media_base_url) {
                Ok(records) => FetchOutcome::Success { records },
                Err(e) => FetchOutcome::TransportError {
                    cause: format!("Invalid response body: {}", e),
                },
            },
            Err(CallError::Remote(message)) => FetchOutcome::RemoteError { message },
            Err(CallError::Transport(cause)) => FetchOutcome::TransportError { cause },
        }
    }
}
