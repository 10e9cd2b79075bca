//! End-to-end catalog resolution against a mock catalog

use crate::common::{
    html, json, no_results_page, object_lookup, resolver, results_page, series_search,
    unsorted_search, RATE_LIMITED_BODY,
};
use libgen_comics::catalog::SeriesQuery;
use libgen_comics::records::{FileState, IssueNumber};
use libgen_comics::CatalogError;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WANTED_URL: &str = "https://comicvine.gamespot.com/wanted/4050-1/";

fn query(issue: Option<&str>) -> SeriesQuery {
    SeriesQuery {
        query: "Wanted".to_string(),
        start_year: Some(2011),
        external_url: WANTED_URL.to_string(),
        series_ids: Vec::new(),
        issue_number: issue.and_then(IssueNumber::parse),
        search_unsorted: true,
    }
}

/// Mounts series 201 with editions 301 (#1) and 302 (#2), and their files
async fn mount_series_201(server: &MockServer) {
    object_lookup("s", 201)
        .respond_with(json(json!({
            "201": {
                "title": "Wanted",
                "date_start": "2011-05-00",
                "editions": {"301": {}, "302": {}}
            }
        })))
        .mount(server)
        .await;
    object_lookup("e", 301)
        .respond_with(json(json!({
            "301": {"title": "Wanted #1", "issue_total_number": "1", "files": {"400": {"f_id": "400"}}}
        })))
        .mount(server)
        .await;
    object_lookup("e", 302)
        .respond_with(json(json!({
            "302": {
                "title": "Wanted #2",
                "issue_total_number": "2",
                "files": {"401": {"f_id": "401"}, "402": {"f_id": "402"}}
            }
        })))
        .mount(server)
        .await;
    object_lookup("f", 401)
        .respond_with(json(json!({
            "401": {
                "broken": "N",
                "md5": "aaa401",
                "locator": "comics\\Wanted 002 (2011) (Digital) (Empire).cbz",
                "filesize": "31457280",
                "archive_files_pic_count": "26",
                "extension": "cbz"
            }
        })))
        .mount(server)
        .await;
    object_lookup("f", 402)
        .respond_with(json(json!({"402": {"broken": "Y", "md5": "bbb402"}})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_pages_until_match() {
    let server = MockServer::start().await;

    // Page 1: one candidate linked elsewhere, one with the wrong year
    series_search(1)
        .respond_with(html(results_page("series", &[101, 102], true)))
        .expect(1)
        .mount(&server)
        .await;
    object_lookup("s", 101)
        .respond_with(json(json!({
            "101": {
                "title": "Wanted",
                "date_start": "2011-01-01",
                "add": {"1": {"key": "309", "value": "https://comicvine.gamespot.com/other/4050-9/"}}
            }
        })))
        .mount(&server)
        .await;
    object_lookup("s", 102)
        .respond_with(json(json!({"102": {"title": "Wanted", "date_start": "2009-00-00"}})))
        .mount(&server)
        .await;

    // Page 2 holds the match; page 3 must never be requested
    series_search(2)
        .respond_with(html(results_page("series", &[201], true)))
        .expect(1)
        .mount(&server)
        .await;
    series_search(3)
        .respond_with(html(results_page("series", &[999], false)))
        .expect(0)
        .mount(&server)
        .await;
    mount_series_201(&server).await;

    // Files of the filtered-out edition are never requested
    object_lookup("f", 400)
        .respond_with(json(json!({"400": {"broken": "N", "md5": "x"}})))
        .expect(0)
        .mount(&server)
        .await;

    // The unsorted search repeats a linked file and adds one more
    unsorted_search()
        .respond_with(html(results_page("file", &[401, 500], false)))
        .expect(1)
        .mount(&server)
        .await;
    object_lookup("f", 500)
        .respond_with(json(json!({"500": {"broken": "N", "md5": "ccc500", "locator": "Wanted 2.cbr"}})))
        .mount(&server)
        .await;

    let files = resolver(&server).resolve(&query(Some("2"))).await.unwrap();

    let ids: Vec<u64> = files.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![401, 500]);

    let linked = &files[0];
    let edition = linked.edition.as_ref().unwrap();
    assert_eq!(edition.id, 302);
    assert_eq!(edition.series.id, 201);
    assert_eq!(edition.number, Some(IssueNumber::Single(2.0)));

    let details = linked.details().unwrap();
    assert_eq!(
        details.download_url.as_deref(),
        Some(format!("{}/get.php?md5=aaa401", server.uri()).as_str())
    );
    assert_eq!(
        details.filename.as_deref(),
        Some("Wanted 002 (2011) (Digital) (Empire).cbz")
    );
    assert_eq!(details.pages, Some(26));
    assert_eq!(details.releaser.as_deref(), Some("Empire"));

    assert!(files[1].edition.is_none());
    assert!(files.iter().all(|f| matches!(f.state, FileState::Available(_))));
}

#[tokio::test]
async fn test_no_results_table_is_not_found() {
    let server = MockServer::start().await;

    series_search(1)
        .respond_with(html(no_results_page()))
        .expect(1)
        .mount(&server)
        .await;
    unsorted_search()
        .respond_with(html(no_results_page()))
        .expect(0)
        .mount(&server)
        .await;

    let err = resolver(&server).resolve(&query(None)).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, CatalogError::SeriesNotFound { ref query } if query == "Wanted"));
}

#[tokio::test]
async fn test_last_page_without_match_is_not_found() {
    let server = MockServer::start().await;

    series_search(1)
        .respond_with(html(results_page("series", &[102], false)))
        .mount(&server)
        .await;
    object_lookup("s", 102)
        .respond_with(json(json!({"102": {"date_start": "1999-01-01"}})))
        .mount(&server)
        .await;

    let err = resolver(&server).resolve_series(&query(None)).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_direct_series_ids_skip_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(html(no_results_page()))
        .expect(0)
        .mount(&server)
        .await;
    mount_series_201(&server).await;
    // Unknown ids come back as an empty envelope and are skipped
    object_lookup("s", 777)
        .respond_with(json(json!([])))
        .mount(&server)
        .await;

    let mut query = query(None);
    query.series_ids = vec![201, 777];
    query.search_unsorted = false;

    let series = resolver(&server).resolve_series(&query).await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].id, 201);
    assert_eq!(series[0].external_url.as_deref(), Some(WANTED_URL));

    object_lookup("f", 400)
        .respond_with(json(json!({"400": {"broken": "N", "md5": "ddd400"}})))
        .mount(&server)
        .await;

    let files = resolver(&server).resolve(&query).await.unwrap();
    let ids: Vec<u64> = files.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![400, 401]);
}

#[tokio::test]
async fn test_matched_series_without_files_is_empty_not_error() {
    let server = MockServer::start().await;

    object_lookup("s", 5)
        .respond_with(json(json!({"5": {"title": "Empty", "editions": []}})))
        .mount(&server)
        .await;
    unsorted_search()
        .respond_with(html(results_page("file", &[], false)))
        .mount(&server)
        .await;

    let mut query = query(Some("1"));
    query.series_ids = vec![5];

    let files = resolver(&server).resolve(&query).await.unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_unsorted_search_includes_issue_number() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(wiremock::matchers::query_param("req", "Wanted 13-14"))
        .and(wiremock::matchers::query_param("filesuns", "unsort"))
        .respond_with(html(results_page("file", &[600, 601], false)))
        .expect(1)
        .mount(&server)
        .await;

    let ids = resolver(&server)
        .unsorted_file_ids(&query(Some("13-14")))
        .await
        .unwrap();

    assert_eq!(ids, vec![600, 601]);
}

#[tokio::test]
async fn test_rate_limited_object_lookup_is_retried() {
    let server = MockServer::start().await;

    object_lookup("s", 201)
        .respond_with(ResponseTemplate::new(200).set_body_string(RATE_LIMITED_BODY))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_series_201(&server).await;

    let mut query = query(None);
    query.series_ids = vec![201];

    let series = resolver(&server).resolve_series(&query).await.unwrap();
    assert_eq!(series[0].title.as_deref(), Some("Wanted"));
}

#[tokio::test]
async fn test_malformed_payload_is_reported() {
    let server = MockServer::start().await;

    object_lookup("s", 201)
        .respond_with(json(json!("not an envelope")))
        .mount(&server)
        .await;

    let mut query = query(None);
    query.series_ids = vec![201];

    let err = resolver(&server).resolve_series(&query).await.unwrap_err();
    assert!(matches!(err, CatalogError::MalformedPayload { .. }));
}

#[tokio::test]
async fn test_direct_ids_all_unknown_is_not_found() {
    let server = MockServer::start().await;

    object_lookup("s", 777)
        .respond_with(json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    object_lookup("s", 778)
        .respond_with(json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    unsorted_search()
        .respond_with(html(no_results_page()))
        .expect(0)
        .mount(&server)
        .await;

    let mut query = query(None);
    query.series_ids = vec![777, 778];

    let err = resolver(&server).resolve(&query).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_envelope_without_requested_id_is_malformed() {
    let server = MockServer::start().await;

    object_lookup("s", 5)
        .respond_with(json(json!({"99": {"title": "Other"}})))
        .mount(&server)
        .await;

    let mut query = query(None);
    query.series_ids = vec![5];

    let err = resolver(&server).resolve_series(&query).await.unwrap_err();

    match err {
        CatalogError::MalformedPayload { url, message } => {
            assert!(url.ends_with("ids=5"));
            assert!(message.contains("99"));
        }
        other => panic!("expected MalformedPayload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_envelope_extra_records_keep_requested_id() {
    let server = MockServer::start().await;

    object_lookup("s", 5)
        .respond_with(json(json!({
            "4": {"title": "Neighbour"},
            "5": {"title": "Requested"}
        })))
        .mount(&server)
        .await;

    let mut query = query(None);
    query.series_ids = vec![5];

    let series = resolver(&server).resolve_series(&query).await.unwrap();

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].id, 5);
    assert_eq!(series[0].title.as_deref(), Some("Requested"));
}
