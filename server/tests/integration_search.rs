use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use search_core::{Document, DocumentSource, EngineConfig, FetchError, Refresher, SearchEngine};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Serves a fixed corpus; fails while `down` is set.
struct StaticSource {
    docs: Mutex<Vec<Document>>,
    down: AtomicBool,
}

impl StaticSource {
    fn new(docs: Vec<Document>) -> Arc<Self> {
        Arc::new(Self { docs: Mutex::new(docs), down: AtomicBool::new(false) })
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Document>, FetchError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(FetchError::Transport("connection refused".into()));
        }
        Ok(self.docs.lock().unwrap().clone())
    }
}

fn capitals() -> Vec<Document> {
    vec![
        Document::new("doc1", "paris is the capital of France").with_author("John Doe"),
        Document::new("doc2", "I love Paris in the spring").with_author("Jane Smith"),
        Document::new("doc3", "Berlin is a city").with_author("John Doe"),
    ]
}

fn app_with(source: Arc<StaticSource>) -> (Router, Arc<Refresher>) {
    let engine = Arc::new(SearchEngine::new(EngineConfig::default()));
    let refresher = Arc::new(Refresher::new(engine, source));
    (server::build_app(server::AppState::new(refresher.clone())), refresher)
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

#[tokio::test]
async fn not_ready_before_first_refresh() {
    let (app, _) = app_with(StaticSource::new(capitals()));

    let (status, _, body) = call(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Index not ready");

    let (status, _, _) = call(&app, Method::GET, "/search?q=paris").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _, body) = call(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index_ready"], false);
    assert!(body["stats"].is_null());
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (app, refresher) = app_with(StaticSource::new(capitals()));
    refresher.refresh(true).await.unwrap();

    let (status, headers, body) = call(&app, Method::GET, "/search?q=berlin%20paris&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["cache-control"], "public, max-age=60");
    assert!(headers.contains_key("x-response-time"));
    assert_eq!(body["total_hits"], 3);
    assert_eq!(body["version"], 1);
    let arr = body["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["id"], "doc3");
    assert_eq!(arr[1]["id"], "doc1");
    assert_eq!(arr[0]["author"], "John Doe");

    let (_, _, page) = call(&app, Method::GET, "/search?q=berlin%20paris&k=2&skip=2").await;
    assert_eq!(page["results"][0]["id"], "doc2");
}

#[tokio::test]
async fn empty_query_is_not_an_error() {
    let (app, refresher) = app_with(StaticSource::new(capitals()));
    refresher.refresh(true).await.unwrap();

    let (status, _, body) = call(&app, Method::GET, "/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_hits"], 0);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_search_parameters_are_json_errors() {
    let (app, refresher) = app_with(StaticSource::new(capitals()));
    refresher.refresh(true).await.unwrap();

    let (status, _, body) = call(&app, Method::GET, "/search?k=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("q"));

    let (status, _, body) = call(&app, Method::GET, "/search?q=paris&k=many").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn status_reports_index_stats() {
    let (app, refresher) = app_with(StaticSource::new(capitals()));
    refresher.refresh(true).await.unwrap();

    let (_, _, health) = call(&app, Method::GET, "/health").await;
    assert_eq!(health["status"], "healthy");

    let (_, _, body) = call(&app, Method::GET, "/").await;
    assert_eq!(body["index_ready"], true);
    assert_eq!(body["stats"]["total_documents"], 3);
    assert_eq!(body["stats"]["refresh_interval_seconds"], 300);
    assert!(body["stats"]["last_refresh"].is_string());
}

#[tokio::test]
async fn documents_are_addressable() {
    let (app, refresher) = app_with(StaticSource::new(capitals()));
    refresher.refresh(true).await.unwrap();

    let (status, _, body) = call(&app, Method::GET, "/doc/doc2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "I love Paris in the spring");

    let (status, _, _) = call(&app, Method::GET, "/doc/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_endpoint_publishes_new_version() {
    let source = StaticSource::new(capitals());
    let (app, refresher) = app_with(source.clone());
    refresher.refresh(true).await.unwrap();
    call(&app, Method::GET, "/search?q=paris").await;

    source.docs.lock().unwrap().retain(|d| d.id != "doc2");
    let (status, _, body) = call(&app, Method::POST, "/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "refreshed");
    assert_eq!(body["version"], 2);
    assert_eq!(body["total_documents"], 2);

    let (_, _, search) = call(&app, Method::GET, "/search?q=paris").await;
    let ids: Vec<&str> = search["results"].as_array().unwrap().iter().map(|h| h["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["doc1"]);
}

#[tokio::test]
async fn failed_refresh_keeps_serving() {
    let source = StaticSource::new(capitals());
    let (app, refresher) = app_with(source.clone());
    refresher.refresh(true).await.unwrap();

    source.down.store(true, Ordering::SeqCst);
    let (status, _, body) = call(&app, Method::POST, "/refresh").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].as_str().unwrap().contains("connection refused"));

    let (status, _, body) = call(&app, Method::GET, "/search?q=paris").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
    assert_eq!(body["total_hits"], 2);
}
