use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderValue, StatusCode}, routing::get, Json, Router};
use docsearch_core::persist::{load_inverted_index, load_lemma_table, load_meta, load_weight_vectors, IndexPaths, MetaFile, TermLevel};
use docsearch_core::{BooleanSearcher, DocId, LemmaTable, PagesDir, SearchConfig, SearchHit, TextSource, VectorIndex, VectorSearcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub doc_ids: Vec<DocId>,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub text: String,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

/// Artifacts loaded once at startup; handlers only read them.
pub struct AppState {
    pub boolean: BooleanSearcher<LemmaTable>,
    pub vector: VectorSearcher<PagesDir>,
    pub meta: Option<MetaFile>,
}

pub fn load_state(index_dir: &str, pages_dir: &str, config: SearchConfig) -> Result<AppState> {
    let paths = IndexPaths::new(index_dir);
    let boolean = BooleanSearcher::new(load_inverted_index(&paths)?, load_lemma_table(&paths)?);
    let vectors = VectorIndex::from_weight_vectors(load_weight_vectors(&paths, TermLevel::Lemma)?);
    let meta = match load_meta(&paths) {
        Ok(meta) => Some(meta),
        Err(err) => {
            tracing::warn!(%err, "meta.json unavailable");
            None
        }
    };
    tracing::info!(
        index_dir,
        num_terms = boolean.index().num_terms(),
        num_docs = vectors.num_docs(),
        "artifacts loaded"
    );
    let vector = VectorSearcher::with_config(vectors, PagesDir::new(pages_dir), config);
    Ok(AppState { boolean, vector, meta })
}

pub fn build_app(index_dir: String, pages_dir: String) -> Result<Router> {
    let state = load_state(&index_dir, &pages_dir, SearchConfig::default())?;
    Ok(router(Arc::new(state)))
}

/// Allowed origins from a comma-separated list. No list, or no parsable entry, allows any origin.
pub fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .into_iter()
        .flat_map(|list| list.split(','))
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();
    let allow_origin = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(allow_origin).allow_methods(Any).allow_headers(Any)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<Arc<AppState>>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let config = state.vector.config();
    let k = config.clamp_top_n(params.k.unwrap_or(config.default_top_n));
    let ranked = state.vector.search_ranked(&params.q, k);
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits = ranked.total_hits, "ranked search");
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: ranked.total_hits, results: ranked.hits })
}

pub async fn boolean_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BooleanParams>,
) -> Result<Json<BooleanResponse>, ApiError> {
    let start = std::time::Instant::now();
    let ids = state
        .boolean
        .boolean_search(&params.q)
        .map_err(|err| api_error(StatusCode::BAD_REQUEST, err.to_string()))?;
    let doc_ids: Vec<DocId> = ids.into_iter().collect();
    let elapsed = start.elapsed();
    Ok(Json(BooleanResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: doc_ids.len(), doc_ids }))
}

pub async fn doc_handler(State(state): State<Arc<AppState>>, Path(doc_id): Path<DocId>) -> Result<Json<DocResponse>, ApiError> {
    match state.vector.texts().load_text(doc_id) {
        Some(text) => Ok(Json(DocResponse { doc_id, text })),
        None => Err(api_error(StatusCode::NOT_FOUND, "not found")),
    }
}

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "index_terms": state.boolean.index().num_terms(),
        "index_docs": state.boolean.index().num_docs(),
        "vector_docs": state.vector.index().num_docs(),
        "meta": state.meta,
    }))
}
