//! Metadata provider lookup
//!
//! An external identifier names a volume on the metadata provider. The
//! lookup yields the volume name, start year and reference URL that seed
//! a catalog series query.

use crate::MetadataError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Resource type prefix the provider uses for volumes
const VOLUME_RESOURCE: &str = "4050";

/// Volume attributes used to find the catalog series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub name: String,
    pub start_year: Option<i32>,
    /// The provider's reference URL for this volume
    pub site_url: String,
}

/// Looks up volumes by external identifier
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn volume(&self, id: u64) -> Result<VolumeInfo, MetadataError>;
}

/// ComicVine API client
#[derive(Debug, Clone)]
pub struct ComicVineClient {
    client: Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct VolumeResponse {
    error: String,
    #[serde(default)]
    results: Value,
}

#[derive(Debug, Deserialize)]
struct VolumeResults {
    name: Option<String>,
    #[serde(default)]
    start_year: Value,
    site_detail_url: Option<String>,
}

impl ComicVineClient {
    /// Creates a client; the provider rejects requests without a User-Agent,
    /// so `client` should come from [`crate::fetcher::build_http_client`]
    pub fn new(client: Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn volume_url(&self, id: u64) -> String {
        format!("{}/volume/{}-{}/", self.api_url, VOLUME_RESOURCE, id)
    }
}

#[async_trait]
impl MetadataProvider for ComicVineClient {
    async fn volume(&self, id: u64) -> Result<VolumeInfo, MetadataError> {
        let url = self.volume_url(id);
        tracing::debug!("Looking up volume {} at {}", id, url);

        let response: VolumeResponse = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("field_list", "name,start_year,site_detail_url"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if response.error != "OK" {
            return Err(MetadataError::Provider {
                id,
                status: response.error,
            });
        }

        // Error responses carry an empty list here
        let results: VolumeResults = serde_json::from_value(response.results)
            .map_err(|_| MetadataError::MissingField {
                id,
                field: "results",
            })?;
        let name = results.name.ok_or(MetadataError::MissingField { id, field: "name" })?;
        let site_url = results.site_detail_url.ok_or(MetadataError::MissingField {
            id,
            field: "site_detail_url",
        })?;

        let info = VolumeInfo {
            name,
            start_year: year_of(&results.start_year),
            site_url,
        };
        tracing::info!(
            "Volume {} is '{}' ({})",
            id,
            info.name,
            info.start_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "unknown year".to_string())
        );

        Ok(info)
    }
}

/// The provider sends the start year as a string, sometimes empty
fn year_of(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
