//! Catalog URL construction
//!
//! Two kinds of URL are built: HTML search pages (`/index.php`) and object
//! API lookups (`/json.php`) for series, editions and files.

use url::form_urlencoded;

/// Object category searched by a search page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Files,
    Editions,
    Series,
    Authors,
    Publishers,
    Works,
}

impl Category {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Files => "f",
            Self::Editions => "e",
            Self::Series => "s",
            Self::Authors => "a",
            Self::Publishers => "p",
            Self::Works => "w",
        }
    }
}

/// Which files a files search returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchSorted {
    #[default]
    All,
    /// Only files linked to an edition
    Sorted,
    /// Only files not linked to any edition
    Unsorted,
}

impl SearchSorted {
    pub fn code(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sorted => "sort",
            Self::Unsorted => "unsort",
        }
    }
}

/// Options for a search results page
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub category: Category,
    /// Rows per page
    pub paging: u32,
    /// 1-based page number; omitted from the URL when None
    pub page: Option<u32>,
    pub sort: SearchSorted,
    pub show_chapters: bool,
    pub google_mode: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            category: Category::Series,
            paging: 25,
            page: None,
            sort: SearchSorted::All,
            show_chapters: false,
            google_mode: false,
        }
    }
}

/// Kind of object requested from the object API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Series,
    Edition,
    File,
}

impl ObjectKind {
    /// Path and field selectors preceding the id list
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Series => "/json.php?object=s&fields=*&addkeys=309,101&ids=",
            Self::Edition => "/json.php?object=e&ids=",
            Self::File => "/json.php?object=f&ids=",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Edition => "edition",
            Self::File => "file",
        }
    }
}

/// Encodes search text, spaces becoming a literal `%20`
pub fn encode_query(query: &str) -> String {
    form_urlencoded::byte_serialize(query.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Builds a search results page URL
///
/// The search is restricted to comics and to the title, author, series,
/// year, publisher and ISBN columns.
///
/// # Example
///
/// ```
/// use libgen_comics::catalog::{build_search_url, SearchOptions};
///
/// let url = build_search_url("https://libgen.example.org", "Saga Deluxe", &SearchOptions::default());
/// assert!(url.starts_with("https://libgen.example.org/index.php?req=Saga%20Deluxe&topics[]=c"));
/// ```
pub fn build_search_url(base: &str, query: &str, options: &SearchOptions) -> String {
    let category = options.category.code();

    let mut url = format!(
        "{}/index.php?req={}&topics[]=c&curtab={}&objects[]={}&res={}&filesuns={}\
         &columns[]=t&columns[]=a&columns[]=s&columns[]=y&columns[]=p&columns[]=i",
        base,
        encode_query(query),
        category,
        category,
        options.paging,
        options.sort.code(),
    );

    if let Some(page) = options.page {
        url.push_str(&format!("&page={}", page));
    }

    if options.show_chapters {
        url.push_str("&showch=on");
    }

    if options.google_mode {
        url.push_str("&gmode=on");
    }

    url
}

/// Builds an object API URL for the given ids
pub fn object_url(base: &str, kind: ObjectKind, ids: &[u64]) -> String {
    let ids = ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{}{}{}", base, kind.suffix(), ids)
}
