//! Search page scraping
//!
//! All knowledge of the catalog's HTML markup lives behind
//! [`ListingScraper`], which turns one search results page into rows of
//! key/text pairs. The resolver only reads the id keys of those rows.
//!
//! # Row keys
//!
//! - `title` - text of the row's first cell
//! - `series_id`, `edition_id`, `file_id` - ids taken from links to
//!   `series.php?id=`, `edition.php?id=` and `file.php?id=`

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// One row of a results table
pub type Row = BTreeMap<String, String>;

/// Extracts rows from a search results page
pub trait ListingScraper: Send + Sync {
    /// Returns the page's rows, or None if the page has no results table
    fn rows_of(&self, page: &str) -> Option<Vec<Row>>;

    /// Returns true if the page links to a further results page
    fn has_next_page(&self, page: &str) -> bool;
}

/// Scraper for the catalog's `#tablelibgen` result listings
///
/// Ids listed in the navbar's JSON export link
/// (`/json.php?object=s&ids=1,2,3`) are added as rows when the table does
/// not already carry them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlListingScraper;

const ID_LINKS: [(&str, &str); 3] = [
    ("series.php?id=", "series_id"),
    ("edition.php?id=", "edition_id"),
    ("file.php?id=", "file_id"),
];

impl ListingScraper for HtmlListingScraper {
    fn rows_of(&self, page: &str) -> Option<Vec<Row>> {
        let document = Html::parse_document(page);

        let table_rows = extract_table_rows(&document);
        let export = extract_json_export(&document);

        if table_rows.is_none() && export.is_none() {
            return None;
        }

        let mut rows = table_rows.unwrap_or_default();

        if let Some((key, ids)) = export {
            for id in ids {
                let known = rows.iter().any(|row| row.get(key) == Some(&id));
                if !known {
                    let mut row = Row::new();
                    row.insert(key.to_string(), id);
                    rows.push(row);
                }
            }
        }

        Some(rows)
    }

    fn has_next_page(&self, page: &str) -> bool {
        let document = Html::parse_document(page);
        match Selector::parse("#paginator_example_top") {
            Ok(selector) => document.select(&selector).next().is_some(),
            Err(_) => false,
        }
    }
}

/// Collects the rows of `#tablelibgen`, or None if there is no results body
fn extract_table_rows(document: &Html) -> Option<Vec<Row>> {
    let body_selector = Selector::parse("#tablelibgen tbody").ok()?;
    let row_selector = Selector::parse("tr").ok()?;

    let body = document.select(&body_selector).next()?;

    Some(body.select(&row_selector).map(extract_row).collect())
}

fn extract_row(row: ElementRef<'_>) -> Row {
    let mut fields = Row::new();

    if let Ok(cell_selector) = Selector::parse("td") {
        if let Some(cell) = row.select(&cell_selector).next() {
            let title = collapse_whitespace(&cell.text().collect::<String>());
            if !title.is_empty() {
                fields.insert("title".to_string(), title);
            }
        }
    }

    if let Ok(link_selector) = Selector::parse("a[href]") {
        for link in row.select(&link_selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            for (marker, key) in ID_LINKS {
                if fields.contains_key(key) {
                    continue;
                }
                if let Some(id) = id_after(href, marker) {
                    fields.insert(key.to_string(), id);
                }
            }
        }
    }

    fields
}

/// Reads the navbar JSON export link, returning the row key and its ids
fn extract_json_export(document: &Html) -> Option<(&'static str, Vec<String>)> {
    let selector = Selector::parse("li.navbar-right a.nav-link").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;

    let (_, query) = href.split_once("json.php?object=")?;
    let (object, ids) = query.split_once("&ids=")?;

    let key = match object {
        "s" => "series_id",
        "e" => "edition_id",
        "f" => "file_id",
        _ => return None,
    };

    let ids: Vec<String> = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect();

    Some((key, ids))
}

/// Returns the digits following `marker` in `href`
fn id_after(href: &str, marker: &str) -> Option<String> {
    let start = href.find(marker)? + marker.len();
    let digits: String = href[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (!digits.is_empty()).then_some(digits)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collects the distinct numeric ids stored under `key`, in row order
pub fn ids_in(rows: &[Row], key: &str) -> Vec<u64> {
    let mut ids: Vec<u64> = Vec::new();
    for id in rows.iter().filter_map(|row| row.get(key)?.parse().ok()) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
