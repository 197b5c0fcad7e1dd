//! Flickr-Harvest: a paged media lister for Flickr accounts
//!
//! This crate walks a user's photo (or favourites) listing page by page under
//! bounded concurrency, persists the discovered media records to SQLite and
//! exports their download links for downstream processing.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Flickr-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote API error during {operation}: {message}")]
    Remote { operation: String, message: String },

    #[error("Transport error during {operation}: {cause}")]
    Transport { operation: String, cause: String },

    #[error("Page {page} failed {attempts} times, giving up on the session")]
    RetriesExhausted { page: u32, attempts: u32 },

    #[error("Concurrency limiter was closed")]
    LimiterClosed,

    #[error("Store operation '{operation}' failed: {source}")]
    StoreOperation {
        operation: String,
        #[source]
        source: storage::StorageError,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Wraps a storage failure with the name of the operation that hit it
    pub fn store(operation: &str, source: storage::StorageError) -> Self {
        Self::StoreOperation {
            operation: operation.to_string(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Flickr-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{CrawlMode, CrawlTarget, MediaRecord, UserProfile};
