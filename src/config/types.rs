use crate::model::CrawlMode;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.flickr.com/services/rest";
pub const DEFAULT_MEDIA_BASE_URL: &str = "http://c1.staticflickr.com";
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 20;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Main configuration structure for Flickr-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Remote API credentials and locations
#[derive(Clone, Deserialize)]
pub struct ApiConfig {
    /// CSRF token sent with every request
    pub csrf: String,

    /// API key sent with every request
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Session cookie, sent as the `Cookie` header
    #[serde(default)]
    pub cookie: Option<String>,

    /// Additional request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// REST endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Base URL that download links are built on
    #[serde(rename = "media-base-url", default = "default_media_base_url")]
    pub media_base_url: String,
}

// Credentials stay out of logs
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("csrf", &"<redacted>")
            .field("api_key", &"<redacted>")
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("endpoint", &self.endpoint)
            .field("media_base_url", &self.media_base_url)
            .finish()
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Which listing to page through
    pub mode: CrawlMode,

    /// Accounts to harvest, by username or nsid
    #[serde(default)]
    pub users: Vec<String>,

    /// Maximum number of page fetches in flight
    #[serde(rename = "concurrency-limit", default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Items requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Attempts per page before the session fails; unbounded when absent
    #[serde(rename = "max-page-attempts", default)]
    pub max_page_attempts: Option<u32>,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path of the line-delimited link export
    #[serde(rename = "export-path")]
    pub export_path: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_media_base_url() -> String {
    DEFAULT_MEDIA_BASE_URL.to_string()
}

fn default_concurrency_limit() -> usize {
    DEFAULT_CONCURRENCY_LIMIT
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
