//! libgen-comics: locate comic issue files on a library catalog
//!
//! This crate resolves an external comic series identifier to the matching
//! catalog series, walks its editions and files, and returns the downloadable
//! files, surviving an upstream that rate limits, times out and throws
//! anti-automation challenges.

pub mod catalog;
pub mod config;
pub mod fetcher;
pub mod metadata;
pub mod output;
pub mod records;
pub mod search;
pub mod state;

use thiserror::Error;

/// Recoverable failure signatures recognised in an upstream response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum UpstreamFailure {
    #[error("request URI too large")]
    OversizedRequest,

    #[error("upstream max_user_connections exceeded")]
    ConnectionLimitExceeded,

    #[error("upstream gateway timeout")]
    GatewayTimeout,

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("upstream bad gateway")]
    BadGateway,

    #[error("upstream server error page")]
    ServerError,

    /// A non-5xx error page, e.g. 404 for a removed object
    #[error("upstream error page{}", .0.map(|status| format!(" {}", status)).unwrap_or_default())]
    ErrorPage(Option<u16>),
}

impl UpstreamFailure {
    /// Returns true if a challenge solver may get past this failure
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Returns true if retrying the same request may succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ErrorPage(_))
    }
}

/// Errors raised by the resource fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Upstream returned {failure} for {url}")]
    Upstream {
        url: String,
        failure: UpstreamFailure,
    },

    #[error("Challenge solver error for {url}: {message}")]
    Solver { url: String, message: String },

    #[error("Fetch cancelled with {pending} URLs outstanding")]
    Cancelled { pending: usize },

    #[error("Gave up after {rounds} rounds with {pending} URLs outstanding")]
    RetriesExhausted { rounds: u32, pending: usize },

    #[error("Fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Main error type for catalog resolution
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No catalog series matches '{query}'")]
    SeriesNotFound { query: String },

    #[error("Malformed upstream payload from {url}: {message}")]
    MalformedPayload { url: String, message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Metadata lookup failed: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::SearchState,
        to: state::SearchState,
    },
}

impl CatalogError {
    /// Returns true for the expected "zero catalog matches" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SeriesNotFound { .. })
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

/// Metadata provider errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metadata provider returned '{status}' for volume {id}")]
    Provider { id: u64, status: String },

    #[error("Volume {id} has no {field}")]
    MissingField { id: u64, field: &'static str },
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{CatalogResolver, SeriesQuery};
pub use config::Config;
pub use fetcher::{classify, Fetcher};
pub use records::{Edition, IssueNumber, ResultFile, Series};
pub use search::{search_external_id, SearchRequest};
pub use state::SearchState;
