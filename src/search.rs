//! Search by external identifier
//!
//! Looks the identifier up on the metadata provider, turns the volume into a
//! [`SeriesQuery`] and runs it through the [`CatalogResolver`].

use crate::catalog::{CatalogResolver, SeriesQuery};
use crate::metadata::{MetadataProvider, VolumeInfo};
use crate::records::{IssueNumber, ResultFile};
use crate::Result;

/// A lookup keyed by the metadata provider's volume id
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub external_id: u64,
    /// Catalog series ids that skip the series search when non-empty
    pub series_ids: Vec<u64>,
    pub issue_number: Option<IssueNumber>,
    pub search_unsorted: bool,
    /// Search text overriding the volume name
    pub query: Option<String>,
}

impl SearchRequest {
    pub fn new(external_id: u64) -> Self {
        Self {
            external_id,
            series_ids: Vec::new(),
            issue_number: None,
            search_unsorted: true,
            query: None,
        }
    }

    /// Builds the catalog query for the looked-up volume
    pub fn series_query(&self, volume: VolumeInfo) -> SeriesQuery {
        SeriesQuery {
            query: self.query.clone().unwrap_or(volume.name),
            start_year: volume.start_year,
            external_url: volume.site_url,
            series_ids: self.series_ids.clone(),
            issue_number: self.issue_number,
            search_unsorted: self.search_unsorted,
        }
    }
}

/// Returns the usable files for an external volume id
///
/// # Errors
///
/// * `CatalogError::Metadata` - the provider lookup failed
/// * `CatalogError::SeriesNotFound` - the catalog has no matching series,
///   distinct from a series that matched but has no files
pub async fn search_external_id(
    provider: &dyn MetadataProvider,
    resolver: &CatalogResolver,
    request: &SearchRequest,
) -> Result<Vec<ResultFile>> {
    let volume = provider.volume(request.external_id).await?;
    let query = request.series_query(volume);

    resolver.resolve(&query).await
}
