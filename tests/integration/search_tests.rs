//! Search by metadata provider id, from config file to result files

use crate::common::{
    fetcher, html, json, no_results_page, object_lookup, results_page, series_search,
    unsorted_search,
};
use libgen_comics::catalog::CatalogResolver;
use libgen_comics::config::load_config;
use libgen_comics::metadata::ComicVineClient;
use libgen_comics::output::format_json;
use libgen_comics::search::{search_external_id, SearchRequest};
use libgen_comics::{CatalogError, IssueNumber};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_volume(metadata: &MockServer, id: u64, name: &str, start_year: &str, url: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/volume/4050-{}/", id)))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "OK",
            "status_code": 1,
            "results": {"name": name, "start_year": start_year, "site_detail_url": url}
        })))
        .expect(1)
        .mount(metadata)
        .await;
}

fn write_config(site_url: &str, api_url: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[catalog]
site-url = "{site_url}/"
page-size = 50

[fetcher]
max-rounds = 4
max-chunk-size = 16

[metadata]
api-url = "{api_url}"
api-key = "test-key"

[user-agent]
client-name = "TestClient"
client-version = "1.0.0"
contact-url = "https://example.com/contact"
"#
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_search_external_id_end_to_end() {
    let catalog = MockServer::start().await;
    let metadata = MockServer::start().await;
    let volume_url = "https://comicvine.gamespot.com/east-of-west/4050-64416/";

    mount_volume(&metadata, 64416, "East of West", "2013", volume_url).await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("req", "East of West"))
        .and(query_param("curtab", "s"))
        .and(query_param("res", "50"))
        .and(query_param("page", "1"))
        .respond_with(html(results_page("series", &[70], false)))
        .expect(1)
        .mount(&catalog)
        .await;
    object_lookup("s", 70)
        .respond_with(json(json!({
            "70": {
                "title": "East of West",
                "add": {"9": {"key": "309", "value": volume_url}},
                "editions": {"80": {}, "81": {}}
            }
        })))
        .mount(&catalog)
        .await;
    object_lookup("e", 80)
        .respond_with(json(json!({"80": {"issue_total_number": "1-5", "files": {"90": {"f_id": "90"}}}})))
        .mount(&catalog)
        .await;
    object_lookup("e", 81)
        .respond_with(json(json!({"81": {"issue_total_number": "6", "files": {"91": {"f_id": "91"}}}})))
        .mount(&catalog)
        .await;
    object_lookup("f", 90)
        .respond_with(json(json!({"90": {"broken": "N", "md5": "e90", "locator": "East of West v1.cbz"}})))
        .mount(&catalog)
        .await;
    object_lookup("f", 91)
        .respond_with(json(json!({"91": {"broken": "N", "md5": "e91"}})))
        .expect(0)
        .mount(&catalog)
        .await;
    unsorted_search()
        .and(query_param("req", "East of West 3"))
        .respond_with(html(no_results_page()))
        .expect(1)
        .mount(&catalog)
        .await;

    let config_file = write_config(&catalog.uri(), &format!("{}/api", metadata.uri()));
    let config = load_config(config_file.path()).unwrap();
    assert_eq!(config.catalog.site_url, catalog.uri());

    let resolver = CatalogResolver::new(&config.catalog, fetcher());
    let provider = ComicVineClient::new(
        reqwest::Client::new(),
        config.metadata.api_url.clone(),
        config.metadata.api_key.clone().unwrap(),
    );

    let mut request = SearchRequest::new(64416);
    request.issue_number = Some(IssueNumber::Single(3.0));

    let files = search_external_id(&provider, &resolver, &request).await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, 90);

    let rendered: Value = serde_json::from_str(&format_json(&files).unwrap()).unwrap();
    assert_eq!(rendered[0]["edition"]["id"], 80);
    assert_eq!(rendered[0]["edition"]["number"], json!([1.0, 5.0]));
    assert_eq!(rendered[0]["series_title"], "East of West");
}

#[tokio::test]
async fn test_not_found_is_distinct_from_empty() {
    let catalog = MockServer::start().await;
    let metadata = MockServer::start().await;

    mount_volume(&metadata, 1, "Nonexistent", "1990", "https://comicvine.gamespot.com/x/4050-1/")
        .await;
    series_search(1)
        .respond_with(html(no_results_page()))
        .mount(&catalog)
        .await;

    let resolver = CatalogResolver::new(&crate::common::catalog_config(&catalog.uri()), fetcher());
    let provider = ComicVineClient::new(
        reqwest::Client::new(),
        format!("{}/api", metadata.uri()),
        "test-key",
    );

    let err = search_external_id(&provider, &resolver, &SearchRequest::new(1))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::SeriesNotFound { ref query } if query == "Nonexistent"));
}

#[tokio::test]
async fn test_metadata_failure_is_surfaced() {
    let catalog = MockServer::start().await;
    let metadata = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Object Not Found",
            "status_code": 101,
            "results": []
        })))
        .mount(&metadata)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&catalog)
        .await;

    let resolver = CatalogResolver::new(&crate::common::catalog_config(&catalog.uri()), fetcher());
    let provider = ComicVineClient::new(
        reqwest::Client::new(),
        format!("{}/api", metadata.uri()),
        "test-key",
    );

    let err = search_external_id(&provider, &resolver, &SearchRequest::new(404))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Metadata(_)));
}
