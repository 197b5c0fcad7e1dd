use crate::config::types::{ApiConfig, Config, CrawlerConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Largest page size the listing methods accept
const MAX_PAGE_SIZE: u32 = 500;

const MAX_CONCURRENCY_LIMIT: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates credentials and remote locations
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if config.csrf.trim().is_empty() {
        return Err(ConfigError::Validation("csrf cannot be empty".to_string()));
    }

    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_key cannot be empty".to_string(),
        ));
    }

    if matches!(&config.cookie, Some(cookie) if cookie.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "cookie cannot be empty when present".to_string(),
        ));
    }

    validate_http_url("endpoint", &config.endpoint)?;
    validate_http_url("media_base_url", &config.media_base_url)?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > MAX_CONCURRENCY_LIMIT {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between 1 and {}, got {}",
            MAX_CONCURRENCY_LIMIT, config.concurrency_limit
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.max_page_attempts == Some(0) {
        return Err(ConfigError::Validation(
            "max_page_attempts must be >= 1 when set".to_string(),
        ));
    }

    if let Some(user) = config.users.iter().find(|u| u.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "users cannot contain empty entries, got '{}'",
            user
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_path.is_empty() {
        return Err(ConfigError::Validation(
            "export_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that `value` parses as an http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}
