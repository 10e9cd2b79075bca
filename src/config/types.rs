use serde::Deserialize;

/// Main configuration structure for libgen-comics
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub solver: Option<SolverConfig>,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Catalog site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog site, without a trailing slash
    #[serde(rename = "site-url")]
    pub site_url: String,

    /// Rows requested per search results page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Also search for files that are not linked to any edition
    #[serde(rename = "search-unsorted", default = "default_true")]
    pub search_unsorted: bool,

    /// Prefix identifying the external reference URL among a series' added keys
    #[serde(
        rename = "external-url-prefix",
        default = "default_external_url_prefix"
    )]
    pub external_url_prefix: String,

    /// Mirror site used to look up direct download links
    #[serde(rename = "mirror-url", default)]
    pub mirror_url: Option<String>,
}

/// Resource fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Chunk size used when the open-file ceiling cannot be determined
    #[serde(rename = "fallback-chunk-size", default = "default_chunk_size")]
    pub fallback_chunk_size: usize,

    /// Upper bound on the chunk size, regardless of the open-file ceiling
    #[serde(rename = "max-chunk-size", default)]
    pub max_chunk_size: Option<usize>,

    /// Maximum number of fetch rounds; unbounded when absent
    #[serde(rename = "max-rounds", default)]
    pub max_rounds: Option<u32>,

    /// Pause between retry rounds (milliseconds)
    #[serde(rename = "retry-delay-ms", default)]
    pub retry_delay_ms: u64,

    /// Total request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            fallback_chunk_size: default_chunk_size(),
            max_chunk_size: None,
            max_rounds: None,
            retry_delay_ms: 0,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Challenge solver proxy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    /// Endpoint accepting `request.get` commands
    pub url: String,

    /// Time the solver may spend on one request (milliseconds)
    #[serde(rename = "max-timeout-ms", default = "default_solver_timeout")]
    pub max_timeout_ms: u64,
}

/// Metadata provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Base URL of the metadata API
    #[serde(rename = "api-url", default = "default_metadata_api")]
    pub api_url: String,

    /// API key sent with every lookup
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,

    /// File holding the API key, read when `api-key` is absent
    #[serde(rename = "api-key-file", default)]
    pub api_key_file: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_url: default_metadata_api(),
            api_key: None,
            api_key_file: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the client
    #[serde(rename = "client-name")]
    pub client_name: String,

    /// Version of the client
    #[serde(rename = "client-version")]
    pub client_version: String,

    /// URL with information about the client
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: Name/Version (+ContactURL)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.client_name, self.client_version, self.contact_url
        )
    }
}

fn default_page_size() -> u32 {
    25
}

fn default_true() -> bool {
    true
}

fn default_external_url_prefix() -> String {
    "https://comicvine.gamespot.com".to_string()
}

fn default_chunk_size() -> usize {
    1024
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_solver_timeout() -> u64 {
    60_000
}

fn default_metadata_api() -> String {
    "https://comicvine.gamespot.com/api".to_string()
}
