use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use common::utils::ingest_limits::{validate_question, validate_site_id};
use retrieval_pipeline::{answer_retrieval::answer_question, retrieve_chunks};
use serde::Deserialize;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub site_id: String,
    pub question: String,
}

pub async fn query_site(
    State(state): State<ApiState>,
    payload: Result<Json<QueryParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    validate_site_id(&state.config, &input.site_id)?;
    validate_question(&state.config, &input.question)?;

    info!(
        site_id = %input.site_id,
        question_bytes = input.question.len(),
        "Received query request"
    );

    let outcome = retrieve_chunks(
        &state.store,
        &state.embedding_provider,
        &input.site_id,
        &input.question,
        state.config.retrieval_top_k,
    )
    .await?;

    let answer =
        answer_question(state.answer_generator.as_ref(), outcome, &input.question).await?;

    Ok(Json(answer))
}
