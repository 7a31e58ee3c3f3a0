use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// Readiness probe: the registry lives in memory, so it reports what it holds.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    let sites = state.store.site_count().await;

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "checks": { "sites": sites },
            "indexing": state.indexing_pipeline.stats(),
        })),
    )
}
