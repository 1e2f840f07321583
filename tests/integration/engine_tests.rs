//! Engine admission, cancellation and live updates

use crate::{html_page, mount_page, test_config};
use ripple_watch::output::LatestPublisher;
use ripple_watch::{CrawlEngine, JobState, LiveUpdate, RippleError, StartCrawlRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_slow_page(server: &MockServer, route: &str, delay: Duration, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_second_job_rejected_while_running() {
    let server = MockServer::start().await;
    mount_slow_page(
        &server,
        "/",
        Duration::from_millis(300),
        html_page("Slow", &[]),
    )
    .await;

    let engine = CrawlEngine::new(test_config()).unwrap();
    let seed = format!("{}/", server.uri());

    let first = engine.start(StartCrawlRequest::new(seed.clone())).unwrap();
    let second = engine.start(StartCrawlRequest::new(seed.clone()));
    assert!(matches!(second, Err(RippleError::Busy)));

    let report = first.wait().await.unwrap();
    assert_eq!(report.state, JobState::Completed);
    assert_eq!(report.statistics.total_urls, 1);

    // The slot is free again once the first job has finished
    let third = engine.start(StartCrawlRequest::new(seed)).unwrap();
    third.wait().await.unwrap();
}

#[tokio::test]
async fn test_invalid_request_does_not_take_the_slot() {
    let engine = CrawlEngine::new(test_config()).unwrap();

    let result = engine.start(StartCrawlRequest::new("mailto:someone@example.com"));
    assert!(matches!(result, Err(RippleError::InvalidUrl(_))));
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_cancel_stops_between_pages() {
    let server = MockServer::start().await;

    let children: Vec<String> = (1..=5).map(|i| format!("/p{}", i)).collect();
    mount_page(&server, "/", 200, html_page("Home", &children)).await;
    for child in &children {
        mount_slow_page(
            &server,
            child,
            Duration::from_millis(200),
            html_page(child, &[]),
        )
        .await;
    }

    let engine = CrawlEngine::new(test_config()).unwrap();
    let mut updates = engine.subscribe().unwrap();

    let handle = engine
        .start(StartCrawlRequest::new(format!("{}/", server.uri())))
        .unwrap();

    // Cancel as soon as the seed has been reported
    let first = updates.recv().await.unwrap();
    assert_eq!(first.total_urls, 1);
    handle.cancel();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.state, JobState::Cancelled);
    assert!(report.statistics.total_urls < 6);
    assert_eq!(
        report.statistics.records.len() as u64,
        report.statistics.total_urls
    );
}

#[tokio::test]
async fn test_job_state_observable_through_handle() {
    let server = MockServer::start().await;
    mount_slow_page(
        &server,
        "/",
        Duration::from_millis(200),
        html_page("Home", &[]),
    )
    .await;

    let engine = CrawlEngine::new(test_config()).unwrap();
    let handle = engine
        .start(StartCrawlRequest::new(format!("{}/", server.uri())))
        .unwrap();

    let mut state = handle.state_receiver();
    state
        .wait_for(|s| *s == JobState::Running)
        .await
        .unwrap();
    assert!(!handle.is_finished());

    state.wait_for(|s| s.is_terminal()).await.unwrap();
    assert_eq!(handle.state(), JobState::Completed);

    handle.wait().await.unwrap();
}

#[tokio::test]
async fn test_live_updates_arrive_in_order() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        200,
        html_page("Home", &["/a".to_string(), "/b".to_string()]),
    )
    .await;
    mount_page(&server, "/a", 200, html_page("A", &[])).await;
    mount_page(&server, "/b", 404, html_page("Gone", &[])).await;

    let engine = CrawlEngine::new(test_config()).unwrap();
    let mut updates = engine.subscribe().unwrap();

    let report = engine
        .start(StartCrawlRequest::new(format!("{}/", server.uri())))
        .unwrap()
        .wait()
        .await
        .unwrap();

    let mut snapshots = Vec::new();
    loop {
        match updates.try_recv() {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(TryRecvError::Empty) => break,
            Err(e) => panic!("unexpected receive error: {:?}", e),
        }
    }

    let totals: Vec<_> = snapshots.iter().map(|s| s.total_urls).collect();
    assert_eq!(totals, vec![1, 2, 3]);

    let errors: Vec<_> = snapshots.iter().map(|s| s.total_errors).collect();
    assert_eq!(errors, vec![0, 0, 1]);

    let last = snapshots.last().unwrap();
    assert_eq!(**last, report.statistics);

    let update = LiveUpdate::from(last.as_ref());
    assert_eq!(update.status_counts.get("404"), Some(&1));
    let titles: Vec<_> = update.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Home", "A", "Gone"]);
}

#[tokio::test]
async fn test_custom_publisher_receives_snapshots() {
    let server = MockServer::start().await;
    mount_page(&server, "/", 200, html_page("Home", &[])).await;

    let publisher = LatestPublisher::new();
    let engine = CrawlEngine::with_publisher(test_config(), Arc::new(publisher.clone())).unwrap();
    assert!(engine.subscribe().is_none());

    engine
        .start(StartCrawlRequest::new(format!("{}/", server.uri())))
        .unwrap()
        .wait()
        .await
        .unwrap();

    let latest = publisher.latest().expect("no snapshot published");
    assert_eq!(latest.total_urls, 1);
    assert_eq!(latest.records[0].title, "Home");
}
