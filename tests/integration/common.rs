//! Shared fixtures for the integration tests

use libgen_comics::catalog::CatalogResolver;
use libgen_comics::config::{CatalogConfig, FetcherConfig, UserAgentConfig};
use libgen_comics::fetcher::Fetcher;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const EXTERNAL_PREFIX: &str = "https://comicvine.gamespot.com";
pub const RATE_LIMITED_BODY: &str =
    r#"<html><body><div class="cf-error">Too many requests for 127.0.0.1</div></body></html>"#;

pub fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        client_name: "TestClient".to_string(),
        client_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

/// Fetcher settings that keep a broken test from looping forever
pub fn fetcher_config() -> FetcherConfig {
    FetcherConfig {
        max_chunk_size: Some(8),
        max_rounds: Some(5),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        ..FetcherConfig::default()
    }
}

pub fn catalog_config(site_url: &str) -> CatalogConfig {
    CatalogConfig {
        site_url: site_url.to_string(),
        page_size: 25,
        search_unsorted: true,
        external_url_prefix: EXTERNAL_PREFIX.to_string(),
        mirror_url: None,
    }
}

pub fn fetcher() -> Fetcher {
    Fetcher::new(fetcher_config(), user_agent())
}

pub fn resolver(server: &MockServer) -> CatalogResolver {
    CatalogResolver::new(&catalog_config(&server.uri()), fetcher())
}

/// A results page listing links of the form `<kind>.php?id=<id>`
pub fn results_page(kind: &str, ids: &[u64], has_next: bool) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr><td><a href="{kind}.php?id={id}">Entry {id}</a></td><td>2011</td></tr>"#
            )
        })
        .collect();
    let paginator = if has_next {
        r##"<div id="paginator_example_top"><a href="#">next</a></div>"##
    } else {
        ""
    };

    format!(
        r#"<html><head><title>Library Genesis</title></head><body>
        <table id="tablelibgen"><thead><tr><th>Title</th><th>Year</th></tr></thead>
        <tbody>{rows}</tbody></table>
        {paginator}
        </body></html>"#
    )
}

pub fn no_results_page() -> String {
    "<html><head><title>Library Genesis</title></head><body><p>Nothing found</p></body></html>"
        .to_string()
}

/// Matches an object API lookup for one id
pub fn object_lookup(object: &str, id: u64) -> MockBuilder {
    Mock::given(method("GET"))
        .and(path("/json.php"))
        .and(query_param("object", object))
        .and(query_param("ids", id.to_string()))
}

/// Matches a series search results page
pub fn series_search(page: u32) -> MockBuilder {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("curtab", "s"))
        .and(query_param("page", page.to_string()))
}

/// Matches the unsorted files search
pub fn unsorted_search() -> MockBuilder {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("curtab", "f"))
        .and(query_param("filesuns", "unsort"))
}

pub fn json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(body.to_string())
}

pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}
