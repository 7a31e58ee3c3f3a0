pub mod answer_retrieval;
pub mod scoring;
pub mod store;

use common::{
    error::AppError, storage::types::text_chunk::TextChunk, utils::embedding::EmbeddingProvider,
};
use tracing::{info, instrument};

pub use store::{QueryOutcome, SiteIndexStore};

// Captures a stored chunk plus its similarity to the question for downstream prompts.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: TextChunk,
    pub score: f32,
}

/// Looks up `site_id` and, when it holds chunks, embeds `question` with the
/// same provider used at index time and returns the top `k` chunks.
///
/// The question is only embedded when there is something to compare it to.
#[instrument(skip_all, fields(site_id = %site_id))]
pub async fn retrieve_chunks(
    store: &SiteIndexStore,
    embedding_provider: &EmbeddingProvider,
    site_id: &str,
    question: &str,
    k: usize,
) -> Result<QueryOutcome, AppError> {
    let Some(index) = store.get(site_id).await else {
        info!("Site has not been indexed");
        return Ok(QueryOutcome::NotIndexed);
    };

    if index.is_empty() {
        info!("Site index holds no chunks");
        return Ok(QueryOutcome::EmptyIndex);
    }

    let question_embedding = embedding_provider
        .embed(question)
        .await
        .map_err(|err| AppError::Processing(format!("failed to embed question: {err}")))?;
    let outcome = store::search_snapshot(&index, &question_embedding, k);

    if let QueryOutcome::Matches(found) = &outcome {
        info!(
            candidates = index.len(),
            returned = found.len(),
            top_score = found.first().map(|c| c.score),
            "Retrieved chunks"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::site_index::SiteIndex;
    use std::sync::Arc;

    const DIM: usize = 256;

    async fn indexed_store(provider: &EmbeddingProvider, texts: &[&str]) -> SiteIndexStore {
        let mut rows = Vec::new();
        for (position, text) in texts.iter().enumerate() {
            let embedding = provider.embed(text).await.expect("embed");
            rows.push((TextChunk::new(position, (*text).to_string()), embedding));
        }
        let store = SiteIndexStore::new();
        store.put("site", SiteIndex::from_rows(None, rows, 0)).await;
        store
    }

    #[tokio::test]
    async fn retrieves_chunk_sharing_question_terms_first() {
        let provider = EmbeddingProvider::new_hashed(DIM);
        let store = indexed_store(
            &provider,
            &[
                "our bakery sells sourdough bread",
                "parking is available behind the building",
                "opening hours monday to friday nine to five",
                "contact us by email",
            ],
        )
        .await;

        let outcome = retrieve_chunks(&store, &provider, "site", "what are the opening hours", 2)
            .await
            .expect("retrieve");

        match outcome {
            QueryOutcome::Matches(found) => {
                assert_eq!(found.len(), 2);
                assert_eq!(found.first().map(|c| c.chunk.position), Some(2));
            }
            other => panic!("expected matches, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn question_embedding_failure_is_a_processing_error() {
        let unreachable = async_openai::Client::with_config(
            async_openai::config::OpenAIConfig::new().with_api_base("http://127.0.0.1:9/v1"),
        );
        let provider = EmbeddingProvider::new_openai(
            Arc::new(unreachable),
            "text-embedding-3-small".to_string(),
            4,
        );
        let store = SiteIndexStore::new();
        store
            .put(
                "site",
                SiteIndex::from_rows(None, [(TextChunk::new(0, "text".into()), vec![1.0; 4])], 0),
            )
            .await;

        let result = retrieve_chunks(&store, &provider, "site", "q", 3).await;
        assert!(matches!(result, Err(AppError::Processing(_))));
    }

    #[tokio::test]
    async fn reports_not_indexed_and_empty() {
        let provider = EmbeddingProvider::new_hashed(DIM);
        let store = SiteIndexStore::new();

        let outcome = retrieve_chunks(&store, &provider, "missing", "q", 3)
            .await
            .expect("retrieve");
        assert!(matches!(outcome, QueryOutcome::NotIndexed));

        store.put("blank", SiteIndex::empty(None)).await;
        let outcome = retrieve_chunks(&store, &provider, "blank", "q", 3)
            .await
            .expect("retrieve");
        assert!(matches!(outcome, QueryOutcome::EmptyIndex));
    }
}
