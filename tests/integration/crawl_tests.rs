//! End-to-end crawl behaviour
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! crawl jobs against them.

use crate::{html_page, mount_page, mount_untouched, test_config};
use ripple_watch::crawler::{build_http_client, crawl, Coordinator, Fetcher, Step};
use ripple_watch::output::{NoopPublisher, StatusKey};
use ripple_watch::{CrawlJob, JobState, StartCrawlRequest};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(seed: String, max_depth: u32) -> StartCrawlRequest {
    StartCrawlRequest {
        url: seed,
        max_depth: Some(max_depth),
        domains: Vec::new(),
        blacklisted: None,
    }
}

#[tokio::test]
async fn test_breadth_first_order() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        200,
        html_page("Home", &[format!("{}/a", base), "/b".to_string()]),
    )
    .await;
    mount_page(&server, "/a", 200, html_page("A", &["/c".to_string()])).await;
    mount_page(&server, "/b", 200, html_page("B", &[])).await;
    mount_page(&server, "/c", 200, html_page("C", &[])).await;

    let report = crawl(test_config(), request(format!("{}/", base), 2))
        .await
        .expect("crawl failed");

    assert_eq!(report.state, JobState::Completed);

    let visited: Vec<_> = report
        .statistics
        .records
        .iter()
        .map(|r| (r.title.as_str(), r.depth))
        .collect();
    assert_eq!(
        visited,
        vec![("Home", 0), ("A", 1), ("B", 1), ("C", 2)]
    );

    assert_eq!(report.statistics.total_urls, 4);
    assert_eq!(report.statistics.total_errors, 0);
    assert_eq!(
        report.statistics.status_counts.get(&StatusKey::Code(200)),
        Some(&4)
    );
    assert_eq!(report.statistics.domain_counts.get("127.0.0.1"), Some(&4));
}

#[tokio::test]
async fn test_max_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", 200, html_page("Home", &["/child".to_string()])).await;
    mount_untouched(&server, "/child").await;

    let report = crawl(test_config(), request(format!("{}/", server.uri()), 0))
        .await
        .expect("crawl failed");

    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.statistics.total_urls, 1);
    assert_eq!(report.statistics.records[0].title, "Home");
}

#[tokio::test]
async fn test_depth_limit_stops_link_following() {
    let server = MockServer::start().await;

    mount_page(&server, "/", 200, html_page("Home", &["/one".to_string()])).await;
    mount_page(&server, "/one", 200, html_page("One", &["/two".to_string()])).await;
    mount_untouched(&server, "/two").await;

    let report = crawl(test_config(), request(format!("{}/", server.uri()), 1))
        .await
        .expect("crawl failed");

    assert_eq!(report.statistics.total_urls, 2);
    assert!(report.statistics.records.iter().all(|r| r.depth <= 1));
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        200,
        html_page(
            "Home",
            &[
                "/page".to_string(),
                format!("{}/page", base),
                "/page#section".to_string(),
                "/".to_string(),
            ],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Page", &["/".to_string()]), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl(test_config(), request(format!("{}/", base), 3))
        .await
        .expect("crawl failed");

    assert_eq!(report.statistics.total_urls, 2);
}

#[tokio::test]
async fn test_timeout_recorded_as_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Slow", &[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = test_config();
    config.crawler.request_timeout_secs = 1;
    config.crawler.connect_timeout_secs = 1;

    let report = crawl(config, request(format!("{}/", server.uri()), 2))
        .await
        .expect("crawl failed");

    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.statistics.total_urls, 1);
    assert_eq!(report.statistics.total_errors, 1);
    assert_eq!(
        report.statistics.status_counts.get(&StatusKey::Error),
        Some(&1)
    );

    let record = &report.statistics.records[0];
    assert_eq!(record.status, None);
    assert_eq!(record.title, "");
    assert!(record.error.is_some());
}

#[tokio::test]
async fn test_unreachable_host_recorded_as_error() {
    // Nothing listens on port 9 of the loopback interface
    let report = crawl(test_config(), request("http://127.0.0.1:9/".to_string(), 1))
        .await
        .expect("crawl failed");

    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.statistics.total_errors, 1);
    assert_eq!(report.statistics.records[0].status, None);
}

#[tokio::test]
async fn test_blocked_extension_not_fetched() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        200,
        html_page(
            "Home",
            &[
                "/style.css".to_string(),
                "/app.js".to_string(),
                "/about".to_string(),
            ],
        ),
    )
    .await;
    mount_page(&server, "/about", 200, html_page("About", &[])).await;
    mount_untouched(&server, "/style.css").await;
    mount_untouched(&server, "/app.js").await;

    let report = crawl(test_config(), request(format!("{}/", server.uri()), 2))
        .await
        .expect("crawl failed");

    let urls: Vec<_> = report
        .statistics
        .records
        .iter()
        .map(|r| r.url.clone())
        .collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", server.uri()),
            format!("{}/about", server.uri())
        ]
    );
}

#[tokio::test]
async fn test_allow_list_excludes_other_hosts() {
    let server = MockServer::start().await;
    let port = server.address().port();

    mount_page(
        &server,
        "/",
        200,
        html_page(
            "Home",
            &[
                format!("http://localhost:{}/elsewhere", port),
                "/local".to_string(),
            ],
        ),
    )
    .await;
    mount_page(&server, "/local", 200, html_page("Local", &[])).await;
    mount_untouched(&server, "/elsewhere").await;

    let mut allow_local = request(format!("{}/", server.uri()), 2);
    allow_local.domains = vec!["127.0.0.1".to_string()];

    let report = crawl(test_config(), allow_local)
        .await
        .expect("crawl failed");

    assert_eq!(report.statistics.total_urls, 2);
    assert_eq!(report.statistics.domain_counts.len(), 1);
}

#[tokio::test]
async fn test_not_found_counted_and_not_followed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", 200, html_page("Home", &["/missing".to_string()])).await;
    mount_page(
        &server,
        "/missing",
        404,
        html_page("Not Found", &["/hidden".to_string()]),
    )
    .await;
    mount_untouched(&server, "/hidden").await;

    let report = crawl(test_config(), request(format!("{}/", server.uri()), 3))
        .await
        .expect("crawl failed");

    let stats = &report.statistics;
    assert_eq!(stats.total_urls, 2);
    assert_eq!(stats.total_errors, 1);
    assert_eq!(stats.status_counts.get(&StatusKey::Code(200)), Some(&1));
    assert_eq!(stats.status_counts.get(&StatusKey::Code(404)), Some(&1));
    assert_eq!(stats.records[1].title, "Not Found");
}

#[tokio::test]
async fn test_relative_links_resolve_against_redirect_target() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/docs/", base).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/docs/", 200, html_page("Docs", &["intro".to_string()])).await;
    mount_page(&server, "/docs/intro", 200, html_page("Intro", &[])).await;

    let report = crawl(test_config(), request(format!("{}/", base), 1))
        .await
        .expect("crawl failed");

    let titles: Vec<_> = report
        .statistics
        .records
        .iter()
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Docs", "Intro"]);
}

#[tokio::test]
async fn test_redirect_target_not_fetched_again() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/home", base).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Home", &["/home".to_string(), "/".to_string()]), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl(test_config(), request(format!("{}/", base), 2))
        .await
        .expect("crawl failed");

    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.statistics.total_urls, 1);
    assert_eq!(report.statistics.records[0].url, format!("{}/", base));
    assert_eq!(report.statistics.records[0].title, "Home");
    assert_eq!(report.statistics.domain_counts.get("127.0.0.1"), Some(&1));
}

#[tokio::test]
async fn test_non_html_body_is_not_parsed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", 200, html_page("Home", &["/logo".to_string()])).await;
    Mock::given(method("GET"))
        .and(path("/logo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(html_page("Not A Page", &["/hidden".to_string()]).into_bytes())
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;
    mount_untouched(&server, "/hidden").await;

    let report = crawl(test_config(), request(format!("{}/", server.uri()), 3))
        .await
        .expect("crawl failed");

    let stats = &report.statistics;
    assert_eq!(stats.total_urls, 2);
    assert_eq!(stats.total_errors, 0);
    assert_eq!(stats.records[1].title, "");
    assert!(stats.records[1].size_bytes > 0);
}

#[tokio::test]
async fn test_body_truncated_at_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![b'x'; 64 * 1024])
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let mut config = test_config();
    config.crawler.max_body_bytes = 4096;
    let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
    let fetcher = Fetcher::new(client, &config.crawler);

    let url = url::Url::parse(&format!("{}/big", server.uri())).unwrap();
    let page = fetcher.fetch(&url).await.expect("fetch failed");

    assert_eq!(page.status_code, 200);
    assert_eq!(page.body.len(), 4096);
    assert!(page.is_html());
}

#[tokio::test]
async fn test_transient_failure_retried_when_enabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", 200, html_page("Recovered", &[])).await;

    let mut config = test_config();
    config.crawler.request_timeout_secs = 1;
    config.crawler.connect_timeout_secs = 1;
    config.crawler.retry_attempts = 1;
    config.crawler.retry_delay_ms = 10;

    let report = crawl(config, request(format!("{}/", server.uri()), 0))
        .await
        .expect("crawl failed");

    assert_eq!(report.statistics.total_errors, 0);
    assert_eq!(report.statistics.records[0].title, "Recovered");
}

#[tokio::test]
async fn test_frontier_after_seed_step() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        200,
        html_page("Home", &["/next".to_string(), "/theme.css".to_string()]),
    )
    .await;

    let config = test_config();
    let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
    let fetcher = Fetcher::new(client, &config.crawler);
    let job = CrawlJob::new::<&str, &str>(&format!("{}/", server.uri()), 1, &[], &[".css"]).unwrap();
    let mut coordinator = Coordinator::new(job, fetcher, Arc::new(NoopPublisher));

    coordinator.start().unwrap();
    let step = coordinator.step().await.unwrap();
    assert!(matches!(step, Step::Fetched(_)));

    let pending: Vec<_> = coordinator.frontier().pending().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url.path(), "/next");
    assert_eq!(pending[0].depth, 1);
    assert_eq!(coordinator.statistics().total_urls, 1);
}

#[tokio::test]
async fn test_fetcher_returns_error_statuses_as_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let config = test_config();
    let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
    let fetcher = Fetcher::new(client, &config.crawler);

    let url = url::Url::parse(&format!("{}/broken", server.uri())).unwrap();
    let page = fetcher.fetch(&url).await.expect("fetch failed");

    assert_eq!(page.status_code, 500);
    assert!(!page.is_success());
    assert_eq!(page.body, b"oops");
}
