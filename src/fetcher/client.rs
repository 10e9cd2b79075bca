use crate::config::{FetcherConfig, UserAgentConfig};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// Each client owns its own connection pool; the fetcher builds one per
/// chunk and drops it when the chunk completes.
///
/// # Example
///
/// ```no_run
/// use libgen_comics::config::{FetcherConfig, UserAgentConfig};
/// use libgen_comics::fetcher::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     client_name: "libgen-comics".to_string(),
///     client_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    config: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}
