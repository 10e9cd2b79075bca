//! Challenge solver client
//!
//! A challenge solver runs a request through a headless browser so the
//! catalog's anti-automation page is passed. The fetcher only needs a single
//! `url -> body` call, modelled by [`ChallengeSolver`].

use crate::config::SolverConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fetches a page through an anti-automation bypass
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// Returns the page body served at `url`
    async fn solve(&self, url: &str) -> Result<String, FetchError>;
}

/// Client for a FlareSolverr-compatible proxy
#[derive(Debug, Clone)]
pub struct FlareSolverr {
    client: Client,
    endpoint: String,
    max_timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct SolverRequest<'a> {
    cmd: &'static str,
    url: &'a str,
    #[serde(rename = "maxTimeout")]
    max_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct SolverResponse {
    status: String,
    #[serde(default)]
    message: String,
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
struct Solution {
    response: Option<String>,
}

impl FlareSolverr {
    /// Creates a solver client for the configured endpoint
    pub fn new(config: &SolverConfig) -> Result<Self, FetchError> {
        // The proxy may legitimately take up to max_timeout to answer
        let client = Client::builder()
            .timeout(Duration::from_millis(config.max_timeout_ms) + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
            max_timeout_ms: config.max_timeout_ms,
        })
    }
}

#[async_trait]
impl ChallengeSolver for FlareSolverr {
    async fn solve(&self, url: &str) -> Result<String, FetchError> {
        let request = SolverRequest {
            cmd: "request.get",
            url,
            max_timeout: self.max_timeout_ms,
        };

        tracing::debug!("Solving challenge for {} via {}", url, self.endpoint);

        let response: SolverResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: self.endpoint.clone(),
                source,
            })?
            .json()
            .await?;

        if response.status != "ok" {
            return Err(FetchError::Solver {
                url: url.to_string(),
                message: format!("status '{}': {}", response.status, response.message),
            });
        }

        response
            .solution
            .and_then(|solution| solution.response)
            .ok_or_else(|| FetchError::Solver {
                url: url.to_string(),
                message: "solution carried no response body".to_string(),
            })
    }
}
