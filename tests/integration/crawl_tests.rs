//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_frontier::config::{Config, FetcherConfig, SchedulerConfig};
use sumi_frontier::policy::{Context, Decision, HandleOnce, Policy, VisitOnce};
use sumi_frontier::storage::{MemoryStore, SqliteStore, Store};
use sumi_frontier::{normalize, Crawler, Link, Response, UrlStatus};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CRAWL_TIMEOUT: Duration = Duration::from_secs(15);

/// Creates a test configuration with short delays
fn create_test_config() -> Config {
    Config {
        scheduler: SchedulerConfig {
            workers: 2,
            min_revisit_delay: 0,
            retry_delay: 10,
            max_retry: 2,
            queue_capacity: 64,
        },
        fetcher: FetcherConfig {
            workers: 2,
            user_agent: "TestBot/1.0".to_string(),
            timeout: 5,
        },
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(format!("<html><body>{}</body></html>", body))
}

async fn mount_page(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn run_to_completion(crawler: Crawler) {
    tokio::time::timeout(CRAWL_TIMEOUT, crawler.wait())
        .await
        .expect("crawl did not finish");
}

#[tokio::test]
async fn test_seed_and_one_link() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", html(r#"<a href="/b">B</a>"#)).await;
    mount_page(&server, "/b", html("no links here")).await;

    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::start(
        &create_test_config(),
        store.clone(),
        Arc::new(VisitOnce::new()),
    )
    .unwrap();
    crawler.crawl(&format!("{}/", base)).await.unwrap();
    run_to_completion(crawler).await;

    for route in ["/", "/b"] {
        let url = normalize(&format!("{}{}", base, route)).unwrap();
        let record = store.get(&url).unwrap();
        assert_eq!(record.status, UrlStatus::Finished, "{}", url);
        assert_eq!(record.visit_count, 1);
        assert!(record.last.is_some());
    }
    assert_eq!(store.visit_count().unwrap(), 2);
    assert!(store.is_finished().unwrap());
}

#[tokio::test]
async fn test_equivalent_links_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        html(&format!(
            r#"<a href="/a">A</a>
               <a href="{}/x/../a#frag">Same A</a>
               <a href="./a">Also A</a>"#,
            base
        )),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">home</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::start(
        &create_test_config(),
        store.clone(),
        Arc::new(VisitOnce::new()),
    )
    .unwrap();
    crawler.crawl(&format!("{}/", base)).await.unwrap();
    run_to_completion(crawler).await;

    assert_eq!(store.visit_count().unwrap(), 2);
    assert_eq!(store.count_by_status(UrlStatus::Finished).unwrap(), 2);
}

#[tokio::test]
async fn test_not_found_is_finished_without_retry() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", html(r#"<a href="/missing">gone</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::start(
        &create_test_config(),
        store.clone(),
        Arc::new(VisitOnce::new()),
    )
    .unwrap();
    crawler.crawl(&format!("{}/", base)).await.unwrap();
    run_to_completion(crawler).await;

    let missing = store
        .get(&normalize(&format!("{}/missing", base)).unwrap())
        .unwrap();
    assert_eq!(missing.status, UrlStatus::Finished);
    assert_eq!(missing.visit_count, 0);
    assert_eq!(missing.error_count, 0);
    assert_eq!(store.visit_count().unwrap(), 1);
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::start(
        &create_test_config(),
        store.clone(),
        Arc::new(VisitOnce::new()),
    )
    .unwrap();
    crawler.crawl(&format!("{}/", base)).await.unwrap();
    run_to_completion(crawler).await;

    let record = store.get(&normalize(&format!("{}/", base)).unwrap()).unwrap();
    assert_eq!(record.status, UrlStatus::Error);
    assert_eq!(record.error_count, 2);
    assert_eq!(store.visit_count().unwrap(), 0);
}

#[tokio::test]
async fn test_recovers_pending_urls_from_sqlite() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/left-over", html("done at last")).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("frontier.db");
    let left_over = normalize(&format!("{}/left-over", base)).unwrap();

    // A previous run discovered the URL but never fetched it
    {
        let store = SqliteStore::new(&db_path).unwrap();
        store.get(&left_over).unwrap();
    }

    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&db_path).unwrap());
    let crawler = Crawler::start(
        &create_test_config(),
        store.clone(),
        Arc::new(VisitOnce::new()),
    )
    .unwrap();
    run_to_completion(crawler).await;

    let record = store.get(&left_over).unwrap();
    assert_eq!(record.status, UrlStatus::Finished);
    assert_eq!(record.visit_count, 1);
    assert!(store.pending().unwrap().is_empty());
}

#[tokio::test]
async fn test_handle_once_follows_first_page_only() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", html(r#"<a href="/a">A</a><a href="/b">B</a>"#)).await;
    mount_page(&server, "/a", html(r#"<a href="/c">C</a>"#)).await;
    mount_page(&server, "/b", html(r#"<a href="/c">C</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::start(
        &create_test_config(),
        store.clone(),
        Arc::new(HandleOnce::new(VisitOnce::new())),
    )
    .unwrap();
    crawler.crawl(&format!("{}/", base)).await.unwrap();
    run_to_completion(crawler).await;

    assert_eq!(store.visit_count().unwrap(), 3);
    assert_eq!(store.count_by_status(UrlStatus::Finished).unwrap(), 3);
}

/// Visits each page once and records what it finds on them
struct Scraping {
    inner: VisitOnce,
    text: Mutex<Vec<String>>,
    values: Mutex<Vec<String>>,
}

impl Policy for Scraping {
    fn schedule(&self, ctx: &Context<'_>) -> Decision {
        self.inner.schedule(ctx)
    }

    fn handle(&self, response: &Response, _links: &mut Vec<Link>) {
        if let Some(text) = response.find_text("div.foo") {
            self.text.lock().unwrap().push(text);
        }
        self.values
            .lock()
            .unwrap()
            .extend(response.find_attr("div#hello", "key"));
    }
}

#[tokio::test]
async fn test_policy_sees_page_content() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        html(r#"<div class="foo">bar</div><div id="hello" key="value">Hello, world!</div>"#),
    )
    .await;

    let policy = Arc::new(Scraping {
        inner: VisitOnce::new(),
        text: Mutex::new(Vec::new()),
        values: Mutex::new(Vec::new()),
    });
    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::start(&create_test_config(), store.clone(), policy.clone()).unwrap();
    crawler.crawl(&base).await.unwrap();
    run_to_completion(crawler).await;

    assert_eq!(*policy.text.lock().unwrap(), vec!["bar"]);
    assert_eq!(*policy.values.lock().unwrap(), vec!["value"]);

    let record = store.get(&normalize(&base).unwrap()).unwrap();
    assert_eq!(record.visit_count, 1);
}

#[tokio::test]
async fn test_out_of_scope_links_are_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(
        &server,
        "/",
        html(r#"<a href="https://elsewhere.example.org/">away</a><a href="/local">local</a>"#),
    )
    .await;
    mount_page(&server, "/local", html("")).await;

    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::start(
        &create_test_config(),
        store.clone(),
        Arc::new(VisitOnce::with_scope(vec!["127.0.0.1".to_string()])),
    )
    .unwrap();
    crawler.crawl(&format!("{}/", base)).await.unwrap();
    run_to_completion(crawler).await;

    let away = store
        .get(&normalize("https://elsewhere.example.org/").unwrap())
        .unwrap();
    assert_eq!(away.status, UrlStatus::Finished);
    assert_eq!(away.visit_count, 0);
    assert_eq!(store.visit_count().unwrap(), 2);
}
