use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use headliner::app::{AppContext, FetchError};
use headliner::cache::QueryStatus;
use headliner::config::Config;
use headliner::domain::{ResultPage, SearchFilters, TopHeadlinesQuery};
use headliner::gateway::{Diagnostics, ErrorReport, Gateway, HttpGateway};
use headliner::pagination::LoadMore;
use headliner::repository::ArticleRepository;

#[derive(Default)]
struct RecordingDiagnostics {
    reports: Mutex<Vec<ErrorReport>>,
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, report: &ErrorReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

fn articles(range: std::ops::Range<u32>) -> serde_json::Value {
    range
        .map(|i| {
            json!({
                "source": {"id": null, "name": "Wire"},
                "author": null,
                "title": format!("Story {i}"),
                "description": null,
                "url": format!("https://wire.test/{i}"),
                "urlToImage": null,
                "publishedAt": "2024-03-01T10:00:00Z",
                "content": null
            })
        })
        .collect()
}

fn page_body(total: u32, range: std::ops::Range<u32>) -> serde_json::Value {
    json!({"status": "ok", "totalResults": total, "articles": articles(range)})
}

fn gateway(server: &MockServer, diagnostics: Arc<RecordingDiagnostics>) -> Arc<dyn Gateway> {
    Arc::new(
        HttpGateway::with_options(
            &format!("{}/v2", server.uri()),
            "test-key",
            Duration::from_secs(2),
            diagnostics,
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn test_top_headlines_sends_api_key_and_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("apiKey", "test-key"))
        .and(query_param("country", "us"))
        .and(query_param("pageSize", "20"))
        .and(query_param("page", "1"))
        .and(query_param_is_missing("category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 0..2)))
        .expect(1)
        .mount(&server)
        .await;

    let repo = ArticleRepository::new(gateway(&server, Arc::default()));
    let page = repo
        .get_top_headlines(&TopHeadlinesQuery::default())
        .await
        .unwrap();

    assert_eq!(page.total_results, 2);
    assert_eq!(page.articles[1].title, "Story 1");
}

#[tokio::test]
async fn test_search_omits_absent_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", "rust lang"))
        .and(query_param("sortBy", "publishedAt"))
        .and(query_param_is_missing("language"))
        .and(query_param_is_missing("from"))
        .and(query_param_is_missing("to"))
        .and(query_param_is_missing("sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, 0..0)))
        .expect(1)
        .mount(&server)
        .await;

    let repo = ArticleRepository::new(gateway(&server, Arc::default()));
    let page: ResultPage = repo
        .search_news(&SearchFilters::query("rust lang"))
        .await
        .unwrap();

    assert!(page.is_empty());
}

#[tokio::test]
async fn test_non_success_maps_to_http_error_and_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        })))
        .mount(&server)
        .await;

    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let repo = ArticleRepository::new(gateway(&server, diagnostics.clone()));
    let err = repo
        .search_news(&SearchFilters::query("x"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FetchError::Http {
            status: 401,
            path: "/everything".into(),
            message: Some("Your API key is invalid or incorrect.".into()),
        }
    );

    let reports = diagnostics.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, Some(401));
    assert_eq!(reports[0].method, "GET");
    assert!(reports[0].url.ends_with("/v2/everything"));
    assert_eq!(reports[0].params.get("q"), Some("x"));
    assert_eq!(reports[0].params.get("apiKey"), None);
}

#[tokio::test]
async fn test_timeout_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(0, 0..0))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let gateway = HttpGateway::with_options(
        &server.uri(),
        "k",
        Duration::from_millis(200),
        diagnostics.clone(),
    )
    .unwrap();
    let repo = ArticleRepository::new(Arc::new(gateway));

    let err = repo
        .get_top_headlines(&TopHeadlinesQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network { ref message, .. } if message == "request timed out"));
    assert_eq!(diagnostics.reports.lock().unwrap()[0].status, None);
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let repo = ArticleRepository::new(gateway(&server, Arc::default()));
    let err = repo
        .get_top_headlines(&TopHeadlinesQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_infinite_headlines_over_http() {
    let server = MockServer::start().await;
    for (page, range) in [(1, 0..20), (2, 20..40), (3, 40..45)] {
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(45, range)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = Config::default();
    config.api.base_url = format!("{}/v2", server.uri());
    let ctx = AppContext::with_gateway(config, gateway(&server, Arc::default()));
    let feed = ctx.service.top_headlines_feed("us", 20);

    let snapshot = feed.fetch().await;
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert_eq!(snapshot.articles.len(), 20);

    assert_eq!(feed.load_more().await, LoadMore::Loaded { page: 2 });
    assert_eq!(feed.load_more().await, LoadMore::Loaded { page: 3 });
    assert_eq!(feed.load_more().await, LoadMore::NoMorePages);

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.articles.len(), 45);
    assert_eq!(snapshot.articles[44].url, "https://wire.test/44");
    assert!(!snapshot.has_more);

    // A second feed over the same filters is served from the cache.
    let again = ctx.service.top_headlines_feed("us", 20).fetch().await;
    assert_eq!(again.articles.len(), 45);
}
