//! HTTP surface tests driven through the router with `oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use pubmed_topjournals::error::{RemoteError, RemoteResult};
use pubmed_topjournals::server::create_router;
use pubmed_topjournals::{
    AliasCollisionPolicy, ArticleRecord, ArticleSource, MetricsIndex, PartialResultWarning, Pipeline,
    SearchCriteria, SearchOutcome,
};

struct FixtureSource {
    warning: Option<PartialResultWarning>,
}

#[async_trait]
impl ArticleSource for FixtureSource {
    async fn search(&self, _criteria: &SearchCriteria) -> RemoteResult<SearchOutcome> {
        Ok(SearchOutcome {
            records: vec![
                ArticleRecord::new("1", "Nature article", "Nature").with_year(2024),
                ArticleRecord::new("2", "Unknown article", "Unknown Journal X"),
                ArticleRecord::new("3", "Lancet article", "The Lancet").with_year(2023),
            ],
            total_available: 120,
            warning: self.warning,
        })
    }
}

/// Fails every search with the error produced by `make`.
struct FailingSource {
    make: fn() -> RemoteError,
}

#[async_trait]
impl ArticleSource for FailingSource {
    async fn search(&self, _criteria: &SearchCriteria) -> RemoteResult<SearchOutcome> {
        Err((self.make)())
    }
}

fn index() -> Arc<MetricsIndex> {
    let index = MetricsIndex::from_json_str(
        r#"[
            {"name": "Nature", "quartile": "Q1", "jif": 50.1, "category": "Multidisciplinary Sciences"},
            {"name": "Lancet", "aliases": ["The Lancet"], "quartile": "Q1", "jif": 98.4}
        ]"#,
        AliasCollisionPolicy::FirstWins,
    )
    .unwrap();
    Arc::new(index)
}

fn pipeline() -> Pipeline {
    Pipeline::new(Arc::new(FixtureSource { warning: None }), index())
}

async fn get(pipeline: Pipeline, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(pipeline, request).await
}

async fn post_search(pipeline: Pipeline, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(pipeline, request).await
}

async fn send(pipeline: Pipeline, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(pipeline).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = get(pipeline(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pubmed-topjournals");
    assert_eq!(body["journals"], 2);
    assert_eq!(body["degraded"], false);
}

#[tokio::test]
async fn test_health_reports_degraded() {
    let pipeline = Pipeline::degraded(Arc::new(FixtureSource { warning: None }));
    let (status, body) = get(pipeline, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["journals"], 0);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_top_journals_by_jif() {
    let (status, body) =
        post_search(pipeline(), &json!({"query": "diabetes prevention", "sort": "jif-desc"})).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["summary"], "3 found → 2 after filters → 2 kept (Top journals)");
    assert_eq!(body["totalFound"], 3);
    assert_eq!(body["afterFilter"], 2);
    assert_eq!(body["kept"], 2);
    assert_eq!(body["totalAvailable"], 120);

    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles[0]["pmid"], "3");
    assert_eq!(articles[0]["metrics"]["journal"], "Lancet");
    assert_eq!(articles[1]["pmid"], "1");
    assert!(body.get("warning").is_none_or(Value::is_null));

    let markdown = body["markdown"].as_str().unwrap();
    assert!(markdown.contains("`JIF 98.4`"));
    assert!(markdown.contains("https://pubmed.ncbi.nlm.nih.gov/3/"));
}

#[tokio::test]
async fn test_search_surfaces_partial_warning() {
    let warning = PartialResultWarning { dropped_batches: 1, missing_records: 200 };
    let pipeline = Pipeline::new(Arc::new(FixtureSource { warning: Some(warning) }), index());

    let (status, body) = post_search(pipeline, &json!({"query": "q"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["warning"]["droppedBatches"], 1);
    assert_eq!(body["warning"]["missingRecords"], 200);
    assert!(body["markdown"].as_str().unwrap().contains("⚠️"));
}

#[tokio::test]
async fn test_search_invalid_criteria() {
    let (status, body) = post_search(pipeline(), &json!({"query": "q", "maxResults": 500})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_criteria");
    assert!(body["error"]["message"].as_str().unwrap().contains("maxResults"));
}

#[tokio::test]
async fn test_search_degraded_top_only() {
    let pipeline = Pipeline::degraded(Arc::new(FixtureSource { warning: None }));

    let (status, body) = post_search(pipeline.clone(), &json!({"query": "q"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["kind"], "metrics_unavailable");

    let (status, body) =
        post_search(pipeline, &json!({"query": "q", "journalMode": "all-journals"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kept"], 3);
}

#[tokio::test]
async fn test_search_remote_failures() {
    let cases: [(fn() -> RemoteError, StatusCode, &str); 4] = [
        (|| RemoteError::rate_limited(Some(5)), StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        (|| RemoteError::server(503, "down"), StatusCode::BAD_GATEWAY, "network"),
        (|| RemoteError::malformed_query("bad term"), StatusCode::BAD_REQUEST, "malformed_query"),
        (
            || RemoteError::Unauthorized { status: 403, message: "blocked".into() },
            StatusCode::BAD_GATEWAY,
            "rejected",
        ),
    ];

    for (make, expected, kind) in cases {
        let pipeline = Pipeline::new(Arc::new(FailingSource { make }), index());
        let (status, body) = post_search(pipeline, &json!({"query": "q"})).await;

        assert_eq!(status, expected, "{kind}");
        assert_eq!(body["error"]["kind"], kind);
    }
}
