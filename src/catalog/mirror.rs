//! Direct download links from a mirror site
//!
//! The mirror's slow-download page sits behind an anti-automation challenge,
//! so it is always fetched through the challenge solver.

use crate::fetcher::ChallengeSolver;
use crate::FetchResult;
use scraper::{Html, Selector};

/// Link text identifying the short-filename download link
const SHORT_FILENAME_LINK: &str = "Download with short filename";

/// Looks up the direct download link for a file hash on a mirror
///
/// # Arguments
///
/// * `solver` - Challenge solver used to fetch the mirror page
/// * `mirror_url` - Base URL of the mirror, without a trailing slash
/// * `md5` - Content hash of the file
/// * `partner` - Download partner server index
///
/// # Returns
///
/// * `Ok(Some(String))` - The download link
/// * `Ok(None)` - The page carries no such link
pub async fn mirror_download_link(
    solver: &dyn ChallengeSolver,
    mirror_url: &str,
    md5: &str,
    partner: u32,
) -> FetchResult<Option<String>> {
    let url = format!("{}/slow_download/{}/0/{}", mirror_url, md5, partner);
    let page = solver.solve(&url).await?;
    Ok(short_filename_link(&page))
}

/// Finds the short-filename download link on a mirror page
pub fn short_filename_link(page: &str) -> Option<String> {
    let document = Html::parse_document(page);
    let selector = Selector::parse("p.mb-4 > a").ok()?;

    document
        .select(&selector)
        .find(|link| link.text().collect::<String>().contains(SHORT_FILENAME_LINK))
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string)
}
