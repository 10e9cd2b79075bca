use crate::config::types::{CatalogConfig, Config, FetcherConfig, SolverConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_fetcher_config(&config.fetcher)?;
    if let Some(solver) = &config.solver {
        validate_solver_config(solver)?;
    }
    validate_http_url("metadata api-url", &config.metadata.api_url)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates catalog configuration
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    validate_http_url("site-url", &config.site_url)?;

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    if config.external_url_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "external_url_prefix cannot be empty".to_string(),
        ));
    }

    if let Some(mirror) = &config.mirror_url {
        validate_http_url("mirror-url", mirror)?;
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.fallback_chunk_size < 1 {
        return Err(ConfigError::Validation(
            "fallback_chunk_size must be >= 1".to_string(),
        ));
    }

    if config.max_chunk_size == Some(0) {
        return Err(ConfigError::Validation(
            "max_chunk_size must be >= 1 when set".to_string(),
        ));
    }

    if config.max_rounds == Some(0) {
        return Err(ConfigError::Validation(
            "max_rounds must be >= 1 when set".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got request={}s connect={}s",
            config.request_timeout_secs, config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates challenge solver configuration
fn validate_solver_config(config: &SolverConfig) -> Result<(), ConfigError> {
    validate_http_url("solver url", &config.url)?;

    if config.max_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "solver max_timeout_ms must be >= 1000ms, got {}ms",
            config.max_timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.client_name.is_empty() {
        return Err(ConfigError::Validation(
            "client_name cannot be empty".to_string(),
        ));
    }

    if !config
        .client_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "client_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.client_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates that a value parses as an HTTP(S) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, value
        )));
    }

    Ok(())
}
