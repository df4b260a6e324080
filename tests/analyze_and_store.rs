// End-to-end: fetch a page from a local mock server, analyze it, store it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use page_analyzer::analyzer::{Analyzer, LinkProber, ProbeOutcome};
use page_analyzer::storage::ReportStore;
use page_analyzer::{analyze_and_store, AnalysisError, AnalyzerConfig, RunError};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r##"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN">
<html>
<head>
  <title>Member area</title>
  <meta name="description" content="Sign in to continue">
</head>
<body>
  <h1>Welcome</h1>
  <h2>Sign in</h2>
  <h2>Help</h2>
  <form action="/login" method="post">
    <input name="user"><input type="password" name="pw">
  </form>
  <a href="/help">Help</a>
  <a href="/old-page">Old page</a>
  <a href="#main">Skip</a>
  <a href="tel:+15550100">Call us</a>
</body>
</html>"##;

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/help"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/old-page"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

fn test_config() -> AnalyzerConfig {
    AnalyzerConfig {
        probe_concurrency: 2,
        probe_timeout: Duration::from_secs(2),
        fetch_timeout: Duration::from_secs(5),
        ..AnalyzerConfig::default()
    }
}

#[tokio::test]
async fn analyze_then_store_round_trip() {
    let server = mock_site().await;
    let config = test_config();
    let client = config.build_client().unwrap();
    let analyzer = Analyzer::with_client(client.clone(), &config);
    let url = Url::parse(&format!("{}/", server.uri())).unwrap();

    let report = analyzer
        .fetch_and_analyze(&client, &url, config.fetch_timeout, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.title, "Member area");
    assert_eq!(report.meta_description, "Sign in to continue");
    assert_eq!(report.html_version, "HTML 4.01");
    assert_eq!(report.headings.h1, 1);
    assert_eq!(report.headings.h2, 2);
    assert_eq!(report.headings.h3, 0);
    assert!(report.has_login_form);
    // /help, /old-page and tel: (no host) are all internal
    assert_eq!(report.internal_link_count, 3);
    assert_eq!(report.external_link_count, 0);
    assert_eq!(report.broken_link_count, 1);
    assert_eq!(report.broken_links[0].href, format!("{}/old-page", server.uri()));
    assert_eq!(report.broken_links[0].status, 404);

    let store = ReportStore::open_in_memory().await.unwrap();
    let id = store.upsert(url.as_str(), &report).await.unwrap();
    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.report, report);
}

#[tokio::test]
async fn analyze_and_store_saves_finished_report() {
    let server = mock_site().await;
    let config = test_config();
    let client = config.build_client().unwrap();
    let analyzer = Analyzer::with_client(client.clone(), &config);
    let url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let store = ReportStore::open_in_memory().await.unwrap();

    let analyzed = analyze_and_store(
        &analyzer,
        &client,
        &url,
        config.fetch_timeout,
        Some(&store),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let id = analyzed.saved_as.unwrap();
    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.url, url.as_str());
    assert_eq!(stored.report, analyzed.report);
    assert_eq!(analyzed.report.broken_link_count, 1);
}

#[tokio::test]
async fn analyze_without_store_saves_nothing() {
    let server = mock_site().await;
    let config = test_config();
    let client = config.build_client().unwrap();
    let analyzer = Analyzer::with_client(client.clone(), &config);
    let url = Url::parse(&format!("{}/", server.uri())).unwrap();

    let analyzed = analyze_and_store(
        &analyzer,
        &client,
        &url,
        config.fetch_timeout,
        None,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(analyzed.saved_as, None);
    assert_eq!(analyzed.report.title, "Member area");
}

#[tokio::test]
async fn cancel_during_fetch_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let config = test_config();
    let client = config.build_client().unwrap();
    let analyzer = Analyzer::with_client(client.clone(), &config);
    let url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let store = ReportStore::open_in_memory().await.unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = analyze_and_store(
        &analyzer,
        &client,
        &url,
        Duration::from_secs(30),
        Some(&store),
        &cancel,
    )
    .await;

    assert!(matches!(result, Err(RunError::Analysis(AnalysisError::Cancelled))));
    assert!(store.list().await.unwrap().is_empty());
}

// Answers every link check, but fires the token while doing so. The checks
// resolve on their first poll, so usually the analysis completes and it's
// the save that has to notice. Either way nothing may be written.
struct CancelWhileChecking {
    cancel: CancellationToken,
}

impl LinkProber for CancelWhileChecking {
    fn probe<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, ProbeOutcome> {
        self.cancel.cancel();
        Box::pin(async { ProbeOutcome::Response(200) })
    }
}

#[tokio::test]
async fn cancel_after_analysis_skips_save() {
    let server = mock_site().await;
    let config = test_config();
    let client = config.build_client().unwrap();
    let url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let store = ReportStore::open_in_memory().await.unwrap();

    let cancel = CancellationToken::new();
    let prober = CancelWhileChecking {
        cancel: cancel.clone(),
    };
    let analyzer = Analyzer::new(Arc::new(prober), 2);

    let result = analyze_and_store(
        &analyzer,
        &client,
        &url,
        config.fetch_timeout,
        Some(&store),
        &cancel,
    )
    .await;

    assert!(matches!(result, Err(RunError::Analysis(AnalysisError::Cancelled))));
    assert!(store.list().await.unwrap().is_empty());
}
