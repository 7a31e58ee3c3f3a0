mod config;
mod services;
mod stats;


pub use config::IndexingConfig;
pub use services::{DefaultIndexingServices, IndexingServices};
pub use stats::{IndexingStats, IndexingStatsSnapshot};

use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use common::{
    error::AppError,
    storage::types::{site_index::SiteIndex, text_chunk::TextChunk},
    utils::embedding::EmbeddingProvider,
};
use futures::{stream, StreamExt};
use retrieval_pipeline::SiteIndexStore;
use serde::Serialize;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{debug, info, instrument, warn};

use crate::utils::{chunking::chunk_text, url_text_retrieval::extract_text};

const SHORT_TEXT_CHARS: usize = 100;
const SNIPPET_CHARS: usize = 200;

/// What an `index_site` call registered.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub chunks: usize,
    pub failed_embeddings: usize,
    pub indexed_at: DateTime<Utc>,
}

/// Fetch → extract → chunk → embed. Every per-item failure degrades instead
/// of aborting, so building an index never fails.
pub struct IndexingPipeline {
    config: IndexingConfig,
    services: Arc<dyn IndexingServices>,
    stats: IndexingStats,
}

impl IndexingPipeline {
    pub fn new(
        config: IndexingConfig,
        embedding_provider: Arc<EmbeddingProvider>,
    ) -> Result<Self, AppError> {
        let services = DefaultIndexingServices::new(&config, embedding_provider)?;
        Ok(Self::with_services(config, Arc::new(services)))
    }

    pub fn with_services(config: IndexingConfig, services: Arc<dyn IndexingServices>) -> Self {
        Self {
            config,
            services,
            stats: IndexingStats::default(),
        }
    }

    pub fn stats(&self) -> IndexingStatsSnapshot {
        self.stats.snapshot()
    }

    /// Builds the index for `url` and registers it under `site_id`,
    /// replacing any previous index. No store lock is held while fetching or
    /// embedding.
    #[instrument(skip_all, fields(site_id = %site_id, url = %url))]
    pub async fn index_site(
        &self,
        store: &SiteIndexStore,
        site_id: &str,
        url: &str,
    ) -> IndexSummary {
        let index = self.build_index(url).await;
        let summary = IndexSummary {
            chunks: index.len(),
            failed_embeddings: index.failed_embeddings(),
            indexed_at: index.indexed_at(),
        };

        store.put(site_id, index).await;
        self.stats.record_page();

        summary
    }

    /// Produces the chunk list and the embedding matrix for `url`.
    pub async fn build_index(&self, url: &str) -> SiteIndex {
        let started = Instant::now();
        info!(url, "Starting index build");

        let text = self.scrape_text(url).await;
        let chunks = chunk_text(&text, self.config.max_words);
        info!(chunks = chunks.len(), "Chunked page text");

        let index = self.embed_chunks(Some(url.to_owned()), chunks).await;

        info!(
            url,
            chunks = index.len(),
            failed_embeddings = index.failed_embeddings(),
            elapsed = ?started.elapsed(),
            "Finished index build"
        );

        index
    }

    async fn scrape_text(&self, url: &str) -> String {
        let document = match self.services.fetch_page(url).await {
            Ok(document) => document,
            Err(err) => {
                self.stats.record_fetch_failure();
                warn!(url, error = %err, "Failed to fetch page; indexing it as empty");
                return String::new();
            }
        };

        let text = extract_text(&document);
        info!(url, text_chars = text.chars().count(), "Scraped page text");
        if text.is_empty() {
            info!(url, "No paragraph text found on page");
        } else if text.chars().count() < SHORT_TEXT_CHARS {
            let snippet: String = text.chars().take(SNIPPET_CHARS).collect();
            debug!(url, %snippet, "Scraped text is very short");
        }

        text
    }

    async fn embed_chunks(&self, source_url: Option<String>, chunks: Vec<String>) -> SiteIndex {
        if chunks.is_empty() {
            debug!("No chunks to embed");
            return SiteIndex::empty(source_url);
        }

        let dimension = self.services.embedding_dimension();
        // Built eagerly so the buffered stream stays Send.
        let pending: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| self.embed_chunk(position, chunk.as_str(), dimension))
            .collect();
        let embeddings: Vec<Option<Vec<f32>>> = stream::iter(pending)
            .buffered(self.config.embedding_concurrency.max(1))
            .collect()
            .await;

        let mut failed = 0usize;
        let mut rows = Vec::with_capacity(chunks.len());
        for (position, (chunk, embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
            let embedding = embedding.unwrap_or_else(|| {
                failed += 1;
                vec![0.0; dimension]
            });
            rows.push((TextChunk::new(position, chunk), embedding));
        }

        if failed > 0 {
            self.stats.record_embedding_failures(failed);
            warn!(
                failed,
                total = rows.len(),
                "Substituted zero vectors for failed chunk embeddings"
            );
        }

        SiteIndex::from_rows(source_url, rows, failed)
    }

    /// `None` when the chunk could not be embedded after retries or the
    /// returned vector has the wrong length.
    async fn embed_chunk(
        &self,
        position: usize,
        chunk: &str,
        dimension: usize,
    ) -> Option<Vec<f32>> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.config.retry_factor_ms)
            .max_delay(self.config.retry_max_delay)
            .map(jitter)
            .take(self.config.embedding_retry_attempts);

        match Retry::spawn(strategy, || self.services.embed(chunk)).await {
            Ok(embedding) if embedding.len() == dimension => Some(embedding),
            Ok(embedding) => {
                warn!(
                    position,
                    expected = dimension,
                    actual = embedding.len(),
                    "Embedding has unexpected dimension"
                );
                None
            }
            Err(err) => {
                warn!(
                    position,
                    chunk_chars = chunk.len(),
                    error = %err,
                    "Failed to embed chunk"
                );
                None
            }
        }
    }
}
