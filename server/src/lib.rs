use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use engine::context::{AdvancedSearch, DocumentInfo, HealthReport, StatsReport, SuggestionReport};
use engine::persist::{load_context, ArtifactPaths};
use engine::{EngineError, RankedResult, RankingMode, SearchContext};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Shared handler state.
///
/// The context behind the lock is immutable; a reload builds a complete
/// replacement and swaps the `Arc`, so requests either see the old set or
/// the new one, never a mix. Handlers take their clone once up front.
#[derive(Clone)]
pub struct AppState {
    context: Arc<RwLock<Arc<SearchContext>>>,
    artifact_root: PathBuf,
    admin_token: Option<String>,
}

impl AppState {
    fn current(&self) -> Arc<SearchContext> {
        self.context.read().clone()
    }

    fn swap(&self, fresh: SearchContext) {
        *self.context.write() = Arc::new(fresh);
    }
}

/// Engine errors carried to HTTP: client mistakes map to 4xx, broken
/// artifacts to 500. The serving process never dies on a bad query.
struct ApiError(EngineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::EmptyQuery | EngineError::InvalidPattern(_) => StatusCode::BAD_REQUEST,
            EngineError::PatternTimeout => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::DataIntegrity(_) | EngineError::ResourceLimit(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

pub fn build_app(artifact_dir: String) -> Result<Router> {
    let context = load_context(&ArtifactPaths::new(&artifact_dir))?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState {
        context: Arc::new(RwLock::new(Arc::new(context))),
        artifact_root: PathBuf::from(&artifact_dir),
        admin_token,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .route("/advanced-search", get(advanced_search_handler))
        .route("/suggestions", get(suggestions_handler))
        .route("/book/:doc_id", get(book_handler))
        .route("/stats", get(stats_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default)]
    pub ranking: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub ranking: &'static str,
    pub count: usize,
    pub results: Vec<RankedResult>,
}

#[derive(Deserialize)]
pub struct AdvancedSearchParams {
    pub regex: String,
    #[serde(default)]
    pub ranking: Option<String>,
}

#[derive(Serialize)]
pub struct AdvancedSearchResponse {
    pub regex: String,
    pub ranking: &'static str,
    pub count: usize,
    #[serde(flatten)]
    pub matches: AdvancedSearch,
}

#[derive(Deserialize)]
pub struct SuggestionParams {
    pub query: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    5
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.current().health())
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let ctx = state.current();
    let mode = mode_from(params.ranking.as_deref());
    let results = ctx.search(&params.query, mode)?;
    Ok(Json(SearchResponse {
        query: params.query,
        ranking: mode.as_str(),
        count: results.len(),
        results,
    }))
}

async fn advanced_search_handler(
    State(state): State<AppState>,
    Query(params): Query<AdvancedSearchParams>,
) -> Result<Json<AdvancedSearchResponse>, ApiError> {
    let ctx = state.current();
    let mode = mode_from(params.ranking.as_deref());
    let matches = ctx.advanced_search(&params.regex, mode)?;
    Ok(Json(AdvancedSearchResponse {
        regex: params.regex,
        ranking: mode.as_str(),
        count: matches.results.len(),
        matches,
    }))
}

async fn suggestions_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<SuggestionReport>, ApiError> {
    let ctx = state.current();
    Ok(Json(ctx.suggestions(&params.query, params.top_n)?))
}

async fn book_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<DocumentInfo>, ApiError> {
    let ctx = state.current();
    Ok(Json(ctx.document_info(&doc_id)?))
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsReport> {
    Json(state.current().stats())
}

/// Load a fresh artifact set from disk and swap it in atomically.
/// In-flight requests keep the context they already cloned.
async fn reload_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let paths = ArtifactPaths::new(&state.artifact_root);
    let fresh = load_context(&paths)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let health = fresh.health();
    state.swap(fresh);
    tracing::info!(
        corpus_size = health.corpus_size,
        vocabulary = health.vocabulary_size,
        "artifact set reloaded"
    );
    Ok(Json(serde_json::json!({
        "reloaded": true,
        "corpus_size": health.corpus_size,
        "vocabulary_size": health.vocabulary_size,
    })))
}

fn mode_from(ranking: Option<&str>) -> RankingMode {
    ranking.map(RankingMode::parse).unwrap_or_default()
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers
        .get("X-ADMIN-TOKEN")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
