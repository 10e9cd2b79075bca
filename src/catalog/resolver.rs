//! Catalog resolution pipeline
//!
//! Resolution walks the catalog's hierarchy in three batched stages:
//!
//! 1. Series: fetched directly by id, or found by paging through series
//!    search results until a candidate matches the query
//! 2. Editions: every edition of every matched series, filtered by issue
//!    number when one was requested
//! 3. Files: every file of the surviving editions, plus unlinked files from
//!    an unsorted files search; broken files are dropped
//!
//! Each stage issues one concurrent batch through the [`Fetcher`].

use crate::catalog::scrape::{ids_in, HtmlListingScraper, ListingScraper};
use crate::catalog::urls::{
    build_search_url, object_url, Category, ObjectKind, SearchOptions, SearchSorted,
};
use crate::config::CatalogConfig;
use crate::fetcher::Fetcher;
use crate::records::{parse_envelope, Edition, IssueNumber, RawRecord, ResultFile, Series};
use crate::state::SearchState;
use crate::{CatalogError, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// What to resolve
#[derive(Debug, Clone)]
pub struct SeriesQuery {
    /// Search text, usually the series name
    pub query: String,
    /// Start year a candidate without an external URL must have
    pub start_year: Option<i32>,
    /// External reference URL a candidate must carry
    pub external_url: String,
    /// Catalog series ids to use instead of searching
    pub series_ids: Vec<u64>,
    pub issue_number: Option<IssueNumber>,
    /// Also collect files that are not linked to any edition
    pub search_unsorted: bool,
}

/// Resolves queries against the catalog
#[derive(Clone)]
pub struct CatalogResolver {
    fetcher: Fetcher,
    scraper: Arc<dyn ListingScraper>,
    site_url: String,
    page_size: u32,
    external_url_prefix: String,
}

impl CatalogResolver {
    /// Creates a resolver using the HTML listing scraper
    pub fn new(config: &CatalogConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            scraper: Arc::new(HtmlListingScraper),
            site_url: config.site_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            external_url_prefix: config.external_url_prefix.clone(),
        }
    }

    /// Replaces the search page scraper
    pub fn with_scraper(mut self, scraper: Arc<dyn ListingScraper>) -> Self {
        self.scraper = scraper;
        self
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Runs the whole pipeline and returns the usable files
    ///
    /// # Errors
    ///
    /// * `CatalogError::SeriesNotFound` - no catalog series matches the query
    /// * `CatalogError::MalformedPayload` - an object API response had an unexpected shape
    /// * `CatalogError::Fetch` - a request could not be completed
    pub async fn resolve(&self, query: &SeriesQuery) -> Result<Vec<ResultFile>> {
        let series = self.resolve_series(query).await?;
        tracing::info!("Matched {} series for '{}'", series.len(), query.query);

        let editions = self.fetch_editions(&series).await?;
        let total_editions = editions.len();
        let editions = filter_editions(editions, query.issue_number.as_ref());
        tracing::info!(
            "{} of {} editions kept after issue filter",
            editions.len(),
            total_editions
        );

        let unsorted = if query.search_unsorted {
            self.unsorted_file_ids(query).await?
        } else {
            Vec::new()
        };

        let files = self.fetch_files(&editions, &unsorted).await?;
        tracing::info!("Resolved {} usable files", files.len());

        Ok(files)
    }

    /// Finds the series matching the query
    ///
    /// With explicit ids each id is fetched and returned without matching;
    /// when the catalog knows none of them the series is not found. Otherwise search pages are walked in order; the first matching
    /// candidate on a page ends the search.
    pub async fn resolve_series(&self, query: &SeriesQuery) -> Result<Vec<Arc<Series>>> {
        let mut state = SearchState::initial(!query.series_ids.is_empty());
        let mut matched = Vec::new();

        while !state.is_terminal() {
            tracing::debug!("Series resolution state: {}", state);

            let Some(page) = state.page() else {
                let records = self
                    .fetch_objects(ObjectKind::Series, &query.series_ids)
                    .await?;
                matched.extend(records.into_iter().flatten().map(|raw| {
                    Arc::new(
                        Series::decode(raw, &self.external_url_prefix)
                            .with_default_external_url(Some(&query.external_url)),
                    )
                }));
                state = if matched.is_empty() {
                    state.transition(SearchState::NotFound)?
                } else {
                    state.transition(SearchState::Matched)?
                };
                continue;
            };

            let options = SearchOptions {
                category: Category::Series,
                paging: self.page_size,
                page: Some(page),
                ..SearchOptions::default()
            };
            let url = build_search_url(&self.site_url, &query.query, &options);
            let body = self.fetcher.fetch_one(&url).await?;

            let Some(rows) = self.scraper.rows_of(&body) else {
                state = state.transition(SearchState::NotFound)?;
                continue;
            };

            let candidate_ids = ids_in(&rows, "series_id");
            tracing::debug!(
                "Search page {} lists {} candidate series",
                page,
                candidate_ids.len()
            );

            let found = self
                .fetch_objects(ObjectKind::Series, &candidate_ids)
                .await?
                .into_iter()
                .flatten()
                .map(|raw| Series::decode(raw, &self.external_url_prefix))
                .find(|series| series.matches(&query.external_url, query.start_year));

            state = if let Some(series) = found {
                tracing::info!("Series {} matches on search page {}", series.id, page);
                matched.push(Arc::new(series));
                state.transition(SearchState::Matched)?
            } else if self.scraper.has_next_page(&body) {
                state.transition(SearchState::SearchPage(page + 1))?
            } else {
                state.transition(SearchState::NotFound)?
            };
        }

        if state == SearchState::NotFound {
            return Err(CatalogError::SeriesNotFound {
                query: query.query.clone(),
            });
        }

        Ok(matched)
    }

    /// Fetches the editions of every series in one batch
    pub async fn fetch_editions(&self, series: &[Arc<Series>]) -> Result<Vec<Arc<Edition>>> {
        let owners: Vec<(u64, &Arc<Series>)> = series
            .iter()
            .flat_map(|s| s.edition_ids.iter().map(move |&id| (id, s)))
            .collect();
        let ids: Vec<u64> = owners.iter().map(|(id, _)| *id).collect();

        let records = self.fetch_objects(ObjectKind::Edition, &ids).await?;

        Ok(records
            .into_iter()
            .zip(owners)
            .filter_map(|(raw, (_, owner))| {
                raw.map(|raw| Arc::new(Edition::decode(raw, Arc::clone(owner))))
            })
            .collect())
    }

    /// Searches for files not linked to any edition and returns their ids
    ///
    /// The issue number, when set, is appended to the search text.
    pub async fn unsorted_file_ids(&self, query: &SeriesQuery) -> Result<Vec<u64>> {
        let text = match &query.issue_number {
            Some(number) => format!("{} {}", query.query, number),
            None => query.query.clone(),
        };
        let options = SearchOptions {
            category: Category::Files,
            sort: SearchSorted::Unsorted,
            ..SearchOptions::default()
        };
        let url = build_search_url(&self.site_url, &text, &options);
        let body = self.fetcher.fetch_one(&url).await?;

        let ids = self
            .scraper
            .rows_of(&body)
            .map(|rows| ids_in(&rows, "file_id"))
            .unwrap_or_default();
        tracing::debug!("Unsorted search for '{}' lists {} files", text, ids.len());

        Ok(ids)
    }

    /// Fetches the files of the editions plus the unlinked ids in one batch
    ///
    /// A file reachable both ways keeps its edition. Broken files are dropped.
    pub async fn fetch_files(
        &self,
        editions: &[Arc<Edition>],
        unsorted_ids: &[u64],
    ) -> Result<Vec<ResultFile>> {
        let mut seen = HashSet::new();
        let mut owners: Vec<(u64, Option<Arc<Edition>>)> = Vec::new();

        for edition in editions {
            for &id in &edition.file_ids {
                if seen.insert(id) {
                    owners.push((id, Some(Arc::clone(edition))));
                }
            }
        }
        for &id in unsorted_ids {
            if seen.insert(id) {
                owners.push((id, None));
            }
        }

        let ids: Vec<u64> = owners.iter().map(|(id, _)| *id).collect();
        let records = self.fetch_objects(ObjectKind::File, &ids).await?;

        let files: Vec<ResultFile> = records
            .into_iter()
            .zip(owners)
            .filter_map(|(raw, (_, edition))| {
                raw.map(|raw| ResultFile::decode(raw, &self.site_url, edition))
            })
            .collect();

        let total = files.len();
        let usable: Vec<ResultFile> = files.into_iter().filter(|f| !f.is_broken()).collect();
        if usable.len() < total {
            tracing::debug!("Dropped {} broken files", total - usable.len());
        }

        Ok(usable)
    }

    /// Fetches one object per id, aligned with `ids`
    ///
    /// Ids the catalog does not know (an empty envelope) come back as None.
    /// A non-empty envelope without the requested id is a malformed payload.
    async fn fetch_objects(&self, kind: ObjectKind, ids: &[u64]) -> Result<Vec<Option<RawRecord>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let urls: Vec<String> = ids
            .iter()
            .map(|&id| object_url(&self.site_url, kind, &[id]))
            .collect();
        let bodies = self.fetcher.fetch_many(&urls).await?;

        ids.iter()
            .zip(urls.iter().zip(bodies))
            .map(|(&id, (url, body))| -> Result<Option<RawRecord>> {
                let mut records = parse_envelope(url, &body)?;
                if records.is_empty() {
                    tracing::warn!("Catalog returned no {} record for id {}", kind.label(), id);
                    return Ok(None);
                }

                let Some(position) = records.iter().position(|r| r.id == id) else {
                    let returned: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();
                    return Err(CatalogError::MalformedPayload {
                        url: url.clone(),
                        message: format!(
                            "requested {} {} but got records {}",
                            kind.label(),
                            id,
                            returned.join(",")
                        ),
                    });
                };
                if records.len() > 1 {
                    tracing::debug!(
                        "Ignoring {} extra records in {} response for id {}",
                        records.len() - 1,
                        kind.label(),
                        id
                    );
                }

                Ok(Some(records.swap_remove(position)))
            })
            .collect()
    }
}

/// Keeps the editions matching `issue_number`, or all of them when it is None
pub fn filter_editions(
    editions: Vec<Arc<Edition>>,
    issue_number: Option<&IssueNumber>,
) -> Vec<Arc<Edition>> {
    match issue_number {
        Some(target) => editions
            .into_iter()
            .filter(|edition| edition.matches_issue(target))
            .collect(),
        None => editions,
    }
}
