use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use search_core::{CacheStats, Document, NotReady, RefreshError, RefreshOutcome, Refresher, SearchEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
    #[serde(default)]
    pub skip: usize,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub version: u64,
    pub total_hits: usize,
    pub took_ms: u128,
    pub took_s: f64,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub text: String,
    pub author: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub index_ready: bool,
    pub stats: Option<IndexStats>,
}

#[derive(Serialize)]
pub struct IndexStats {
    pub total_documents: u32,
    pub terms: usize,
    pub version: u64,
    pub last_refresh: Option<String>,
    pub refresh_interval_seconds: u64,
    pub cache: CacheStats,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    pub version: Option<u64>,
    pub total_documents: u32,
    pub last_refresh: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub refresher: Arc<Refresher>,
}

impl AppState {
    pub fn new(refresher: Arc<Refresher>) -> Self {
        Self { engine: Arc::clone(refresher.engine()), refresher }
    }
}

/// Errors surfaced to HTTP clients as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotReady,
    NotFound(String),
    Upstream(String),
    Internal(String),
}

impl From<NotReady> for ApiError {
    fn from(_: NotReady) -> Self { ApiError::NotReady }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Fetch(e) => ApiError::Upstream(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "Index not ready".to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .route("/doc/:id", get(doc_handler))
        .route("/refresh", post(refresh_handler))
        .with_state(state)
        .layer(middleware::from_fn(response_time))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

// CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
fn cors_layer() -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let origins: Vec<HeaderValue> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(origins))
    }
}

async fn response_time(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(v) = HeaderValue::from_str(&format!("{elapsed_ms:.2}ms")) {
        response.headers_mut().insert("x-response-time", v);
    }
    response
}

fn rfc3339(t: OffsetDateTime) -> Option<String> {
    t.format(&Rfc3339).ok()
}

pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let stats = state.engine.stats();
    let index_stats = stats.version.map(|version| IndexStats {
        total_documents: stats.documents,
        terms: stats.terms,
        version,
        last_refresh: stats.built_at.and_then(rfc3339),
        refresh_interval_seconds: state.refresher.interval().as_secs(),
        cache: stats.cache,
    });
    Json(StatusResponse { status: "ok", index_ready: index_stats.is_some(), stats: index_stats })
}

pub async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.engine.is_ready() {
        return Err(ApiError::NotReady);
    }
    Ok(Json(serde_json::json!({ "status": "healthy" })))
}

pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let Query(params) = params?;
    let k = state.engine.config().clamp_top_k(params.k);
    let results = state.engine.search_page(&params.q, params.skip, k)?;

    let hits = results
        .hits
        .into_iter()
        .map(|hit| SearchHit {
            id: hit.id,
            score: hit.score,
            text: hit.document.text.clone(),
            author: hit.document.author.clone(),
            timestamp: hit.document.timestamp.clone(),
        })
        .collect();

    let elapsed = start.elapsed();
    let body = SearchResponse {
        query: params.q,
        version: results.version,
        total_hits: results.total_hits,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        results: hits,
    };
    Ok(([(header::CACHE_CONTROL, "public, max-age=60")], Json(body)).into_response())
}

pub async fn doc_handler(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Document>, ApiError> {
    match state.engine.document(&id)? {
        Some(doc) => Ok(Json(Document::clone(&doc))),
        None => Err(ApiError::NotFound(format!("document {id:?}"))),
    }
}

pub async fn refresh_handler(State(state): State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    let outcome = state.refresher.refresh(true).await?;
    let stats = state.engine.stats();
    let version = match outcome {
        RefreshOutcome::Published { version, .. } => Some(version),
        RefreshOutcome::Unchanged { .. } => stats.version,
    };
    Ok(Json(RefreshResponse {
        status: "refreshed",
        version,
        total_documents: stats.documents,
        last_refresh: stats.built_at.and_then(rfc3339),
    }))
}
