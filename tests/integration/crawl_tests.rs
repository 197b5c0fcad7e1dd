//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the REST API and run the full
//! lookup, crawl, store and export cycle end-to-end.

use flickr_harvest::config::{ApiConfig, Config, CrawlerConfig, OutputConfig};
use flickr_harvest::crawler::{harvest, preview, Coordinator};
use flickr_harvest::model::CrawlMode;
use flickr_harvest::output::{export_links, load_statistics};
use flickr_harvest::storage::{SqliteStore, Store};
use flickr_harvest::HarvestError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NSID: &str = "42@N07";

/// Creates a test configuration pointing at the mock server
fn create_test_config(endpoint: &str, dir: &Path, mode: CrawlMode) -> Config {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), "HarvestTest/1.0".to_string());

    Config {
        api: ApiConfig {
            csrf: "csrf-token".to_string(),
            api_key: "api-key".to_string(),
            cookie: Some("session=abc".to_string()),
            headers,
            endpoint: endpoint.to_string(),
            media_base_url: "http://media.test".to_string(),
        },
        crawler: CrawlerConfig {
            mode,
            users: vec!["someone".to_string()],
            concurrency_limit: 2,
            request_timeout: 5,
            page_size: 2,
            max_page_attempts: None,
        },
        output: OutputConfig {
            database_path: dir.join("harvest.db").to_string_lossy().into_owned(),
            export_path: dir.join("gen_link.txt").to_string_lossy().into_owned(),
        },
    }
}

/// Mounts the two lookup calls for `someone`
async fn mount_profile(server: &MockServer, photos: u64, favorites: u64) {
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getPhotos"))
        .and(query_param("user_id", "someone"))
        .and(query_param("per_page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"user": {{"nsid": "{}", "username": "someone", "ispro": 0}},
                "photos": {{"page": 0, "pages": 0, "perpage": 0, "total": "{}", "photo": []}},
                "stat": "ok"}}"#,
            NSID, photos
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("method", "flickr.favorites.getList"))
        .and(query_param("user_id", NSID))
        .and(query_param("per_page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"photos": {{"total": {}, "photo": []}}, "stat": "ok"}}"#,
            favorites
        )))
        .mount(server)
        .await;
}

fn page_body(page: u32, ids: &[u64]) -> String {
    let photos: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{"id": "{}", "owner": "{}", "secret": "sec{}", "server": "65535",
                    "farm": 66, "title": "photo {}", "ispublic": 1, "isfriend": 0,
                    "isfamily": 0, "safe": "1"}}"#,
                id, NSID, id, id
            )
        })
        .collect();
    format!(
        r#"{{"photos": {{"page": {}, "perpage": 2, "photo": [{}]}}, "stat": "ok"}}"#,
        page,
        photos.join(",")
    )
}

/// Mounts one listing page of `method_name`
async fn mount_page(server: &MockServer, method_name: &str, page: u32, ids: &[u64]) {
    Mock::given(method("GET"))
        .and(query_param("method", method_name))
        .and(query_param("user_id", NSID))
        .and(query_param("per_page", "2"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_body(page, ids)))
        .mount(server)
        .await;
}

/// Counts the listing requests the server received for `page`
async fn requests_for_page(server: &MockServer, page: u32) -> usize {
    let requests = server.received_requests().await.unwrap_or_default();
    requests
        .iter()
        .filter(|request| {
            let pairs: HashMap<_, _> = request.url.query_pairs().into_owned().collect();
            pairs.get("per_page").map(String::as_str) == Some("2")
                && pairs.get("page") == Some(&page.to_string())
        })
        .count()
}

fn link(id: u64) -> String {
    format!("http://media.test/66/65535/{}_sec{}_b_d.jpg", id, id)
}

#[tokio::test]
async fn test_full_harvest_with_retry_and_export() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_profile(&mock_server, 5, 0).await;
    mount_page(&mock_server, "flickr.people.getPhotos", 1, &[1, 2]).await;

    // Page 2 fails once, then succeeds
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getPhotos"))
        .and(query_param("per_page", "2"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "flickr.people.getPhotos", 2, &[3, 4]).await;
    mount_page(&mock_server, "flickr.people.getPhotos", 3, &[5]).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), CrawlMode::Photos);
    let db_path = config.output.database_path.clone();
    let export_path = config.output.export_path.clone();
    let users = config.crawler.users.clone();

    let outcomes = harvest(config, &users).await.unwrap();

    assert_eq!(outcomes.len(), 1);
    let report = outcomes[0].result.as_ref().unwrap();
    assert_eq!(report.user_id, NSID);
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.attempts, 4);
    assert_eq!(report.failed_attempts, 1);
    assert_eq!(report.media_collected, 5);
    assert_eq!(report.media_inserted, 5);

    assert_eq!(requests_for_page(&mock_server, 1).await, 1);
    assert_eq!(requests_for_page(&mock_server, 2).await, 2);
    assert_eq!(requests_for_page(&mock_server, 3).await, 1);

    let mut store = SqliteStore::new(Path::new(&db_path)).unwrap();
    let stats = load_statistics(&store).unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.media, 5);
    assert_eq!(stats.unextracted, 5);

    let written = export_links(&mut store, Path::new(&export_path)).unwrap();
    assert_eq!(written, 5);

    let content = fs::read_to_string(&export_path).unwrap();
    let mut lines: Vec<String> = content.lines().map(String::from).collect();
    lines.sort();
    let mut expected: Vec<String> = (1..=5).map(link).collect();
    expected.sort();
    assert_eq!(lines, expected);
    assert_eq!(store.count_unextracted().unwrap(), 0);
}

#[tokio::test]
async fn test_credentials_and_headers_are_sent() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_profile(&mock_server, 1, 0).await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getPhotos"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .and(query_param("csrf", "csrf-token"))
        .and(query_param("api_key", "api-key"))
        .and(query_param("format", "json"))
        .and(query_param("nojsoncallback", "1"))
        .and(header("cookie", "session=abc"))
        .and(header("user-agent", "HarvestTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_body(1, &[9])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path(), CrawlMode::Photos);
    let store = SqliteStore::open_in_memory().unwrap();
    let coordinator = Coordinator::with_store(config, store).unwrap();

    let report = coordinator.run_session("someone").await.unwrap();

    assert_eq!(report.attempts, 1);
    assert_eq!(report.failed_attempts, 0);
    assert_eq!(report.media_inserted, 1);
}

#[tokio::test]
async fn test_favorites_mode_crawls_favorites_listing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_profile(&mock_server, 100, 3).await;
    mount_page(&mock_server, "flickr.favorites.getList", 1, &[7, 8]).await;
    mount_page(&mock_server, "flickr.favorites.getList", 2, &[11]).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), CrawlMode::Favorites);
    let store = SqliteStore::open_in_memory().unwrap();
    let coordinator = Coordinator::with_store(config, store).unwrap();

    let report = coordinator.run_session("someone").await.unwrap();

    assert_eq!(report.mode, CrawlMode::Favorites);
    assert_eq!(report.total_pages, 2);
    assert_eq!(report.media_collected, 3);

    let store = coordinator.store();
    let store = store.lock().unwrap();
    let mut links = store.select_unextracted_links().unwrap();
    links.sort();
    let mut expected = vec![link(7), link(8), link(11)];
    expected.sort();
    assert_eq!(links, expected);
}

#[tokio::test]
async fn test_attempt_cap_stores_no_media() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_profile(&mock_server, 4, 0).await;
    mount_page(&mock_server, "flickr.people.getPhotos", 1, &[1, 2]).await;
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getPhotos"))
        .and(query_param("per_page", "2"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"stat": "fail", "code": 105, "message": "Service currently unavailable"}"#,
        ))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), dir.path(), CrawlMode::Photos);
    config.crawler.max_page_attempts = Some(3);
    let store = SqliteStore::open_in_memory().unwrap();
    let coordinator = Coordinator::with_store(config, store).unwrap();

    let result = coordinator.run_session("someone").await;

    match result {
        Err(HarvestError::RetriesExhausted { page, attempts }) => {
            assert_eq!(page, 2);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(requests_for_page(&mock_server, 2).await, 3);

    let store = coordinator.store();
    let store = store.lock().unwrap();
    assert_eq!(store.count_users().unwrap(), 1);
    assert_eq!(store.count_media().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_account_stores_profile_only() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_profile(&mock_server, 0, 0).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), CrawlMode::Photos);
    let store = SqliteStore::open_in_memory().unwrap();
    let coordinator = Coordinator::with_store(config, store).unwrap();

    let report = coordinator.run_session("someone").await.unwrap();

    assert_eq!(report.total_pages, 0);
    assert_eq!(report.attempts, 0);
    assert_eq!(requests_for_page(&mock_server, 1).await, 0);

    let store = coordinator.store();
    let store = store.lock().unwrap();
    assert_eq!(store.count_users().unwrap(), 1);
    assert_eq!(store.count_media().unwrap(), 0);
}

#[tokio::test]
async fn test_ok_response_without_listing_is_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_profile(&mock_server, 2, 0).await;

    // First answer for page 1 is "ok" but carries no photos
    Mock::given(method("GET"))
        .and(query_param("method", "flickr.people.getPhotos"))
        .and(query_param("per_page", "2"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"stat": "ok"}"#))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "flickr.people.getPhotos", 1, &[1, 2]).await;

    let config = create_test_config(&mock_server.uri(), dir.path(), CrawlMode::Photos);
    let store = SqliteStore::open_in_memory().unwrap();
    let coordinator = Coordinator::with_store(config, store).unwrap();

    let report = coordinator.run_session("someone").await.unwrap();

    assert_eq!(report.attempts, 2);
    assert_eq!(report.failed_attempts, 1);
    assert_eq!(report.media_collected, 2);
    assert_eq!(requests_for_page(&mock_server, 1).await, 2);

    let store = coordinator.store();
    assert_eq!(store.lock().unwrap().count_media().unwrap(), 2);
}

#[tokio::test]
async fn test_preview_looks_up_without_creating_database() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_profile(&mock_server, 5, 3).await;
    Mock::given(method("GET"))
        .and(query_param("user_id", "ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"stat": "fail", "code": 1, "message": "User not found"}"#,
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path(), CrawlMode::Photos);
    let users = vec!["someone".to_string(), "ghost".to_string()];

    let outcomes = preview(&config, &users).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    let profile = outcomes[0].result.as_ref().unwrap();
    assert_eq!(profile.nsid, NSID);
    assert_eq!(profile.total_pages, 3);
    assert_eq!(profile.favorite_pages, 2);
    assert_eq!(outcomes[1].user, "ghost");
    assert!(matches!(outcomes[1].result, Err(HarvestError::Remote { .. })));

    assert!(!Path::new(&config.output.database_path).exists());
    assert_eq!(requests_for_page(&mock_server, 1).await, 0);
}
