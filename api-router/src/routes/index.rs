use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use common::utils::ingest_limits::{validate_index_url, validate_site_id};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct IndexParams {
    pub site_id: String,
    pub url: String,
}

pub async fn index_site(
    State(state): State<ApiState>,
    payload: Result<Json<IndexParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    validate_site_id(&state.config, &input.site_id)?;
    let url = validate_index_url(&state.config, &input.url)?;

    info!(
        site_id = %input.site_id,
        url = %url,
        "Received index request"
    );

    let summary = state
        .indexing_pipeline
        .index_site(&state.store, &input.site_id, url.as_str())
        .await;

    Ok(Json(json!({
        "status": "indexed",
        "site_id": input.site_id,
        "chunks": summary.chunks,
        "failed_embeddings": summary.failed_embeddings,
        "indexed_at": summary.indexed_at,
    })))
}
