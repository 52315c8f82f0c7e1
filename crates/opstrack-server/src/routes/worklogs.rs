//! Worklog routes: natural-language parsing and model health.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use opstrack_resolve::ParseResult;
use opstrack_runtime::ParseRequest;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/worklogs/parse", post(parse))
        .route("/worklogs/health", get(health))
        .route("/worklogs/candidates/refresh", post(refresh_candidates))
}

/// POST /api/worklogs/parse: free text → structured entries.
///
/// Always 200: model and candidate failures come back as warnings.
async fn parse(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ParseRequest>,
) -> Json<ParseResult> {
    Json(state.parser.parse(&req).await)
}

/// GET /api/worklogs/health: 503 when the model is unreachable.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.parser.check_health().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// POST /api/worklogs/candidates/refresh: drop the cached candidate pools.
async fn refresh_candidates(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.candidates.invalidate();
    Json(serde_json::json!({ "refreshed": true }))
}
