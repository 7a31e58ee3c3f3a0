use std::{collections::HashMap, sync::Arc};

use common::{
    error::AppError,
    storage::types::{site_index::SiteIndex, text_chunk::TextChunk},
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{scoring::rank_chunks, RetrievedChunk};

/// Result of looking up a site. The first two variants are distinct,
/// caller-visible conditions and never carry scores.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    NotIndexed,
    EmptyIndex,
    Matches(Vec<RetrievedChunk>),
}

/// Process-wide registry of site indexes.
///
/// Each entry is an immutable `Arc<SiteIndex>`; `put` swaps the whole `Arc`,
/// so a reader either sees the previous index or the new one, never a mix.
#[derive(Debug, Default)]
pub struct SiteIndexStore {
    sites: RwLock<HashMap<String, Arc<SiteIndex>>>,
}

impl SiteIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was registered for `site_id`. Returns the chunk count.
    pub async fn put(&self, site_id: &str, index: SiteIndex) -> usize {
        let count = index.len();
        let source_url = index.source_url().map(str::to_owned);
        let previous = self
            .sites
            .write()
            .await
            .insert(site_id.to_owned(), Arc::new(index));

        info!(
            site_id,
            chunks = count,
            source_url = ?source_url,
            replaced = previous.is_some(),
            "Registered site index"
        );

        count
    }

    /// Registers separately built chunk and embedding lists.
    pub async fn put_parts(
        &self,
        site_id: &str,
        chunks: Vec<TextChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<usize, AppError> {
        let index = SiteIndex::try_from_parts(chunks, embeddings)?;
        Ok(self.put(site_id, index).await)
    }

    /// Snapshot of the current index for `site_id`.
    pub async fn get(&self, site_id: &str) -> Option<Arc<SiteIndex>> {
        self.sites.read().await.get(site_id).cloned()
    }

    pub async fn site_count(&self) -> usize {
        self.sites.read().await.len()
    }

    /// Top-`k` chunks of `site_id` by cosine similarity to `question_embedding`.
    ///
    /// Scoring runs on a snapshot after the read guard is released.
    pub async fn query(
        &self,
        site_id: &str,
        question_embedding: &[f32],
        k: usize,
    ) -> QueryOutcome {
        let Some(index) = self.get(site_id).await else {
            debug!(site_id, "Query for site that was never indexed");
            return QueryOutcome::NotIndexed;
        };

        search_snapshot(&index, question_embedding, k)
    }
}

pub(crate) fn search_snapshot(
    index: &SiteIndex,
    question_embedding: &[f32],
    k: usize,
) -> QueryOutcome {
    if index.is_empty() {
        return QueryOutcome::EmptyIndex;
    }

    QueryOutcome::Matches(rank_chunks(index, question_embedding, k))
}
