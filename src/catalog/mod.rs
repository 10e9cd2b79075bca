//! Catalog access: URLs, search page scraping and the resolution pipeline
//!
//! - `urls`: search page and object API URL construction
//! - `scrape`: the markup adapter turning search pages into rows
//! - `resolver`: Series -> Edition -> File resolution
//! - `mirror`: direct download links from a mirror site

mod mirror;
mod resolver;
mod scrape;
mod urls;

pub use mirror::{mirror_download_link, short_filename_link};
pub use resolver::{filter_editions, CatalogResolver, SeriesQuery};
pub use scrape::{ids_in, HtmlListingScraper, ListingScraper, Row};
pub use urls::{
    build_search_url, encode_query, object_url, Category, ObjectKind, SearchOptions,
    SearchSorted,
};
