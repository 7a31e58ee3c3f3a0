use chrono::{DateTime, Utc};

use super::text_chunk::TextChunk;
use crate::error::AppError;

/// Chunks of one indexed page plus their embedding matrix.
///
/// The two sequences are only ever built together, so row `i` of
/// `embeddings` always belongs to `chunks[i]`.
#[derive(Debug, Clone)]
pub struct SiteIndex {
    chunks: Vec<TextChunk>,
    embeddings: Vec<Vec<f32>>,
    source_url: Option<String>,
    indexed_at: DateTime<Utc>,
    failed_embeddings: usize,
}

impl SiteIndex {
    /// Builds an index from `(chunk, embedding)` rows. `failed_embeddings` is
    /// the number of rows carrying a zero-vector placeholder.
    pub fn from_rows<I>(source_url: Option<String>, rows: I, failed_embeddings: usize) -> Self
    where
        I: IntoIterator<Item = (TextChunk, Vec<f32>)>,
    {
        let (chunks, embeddings): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        Self {
            chunks,
            embeddings,
            source_url,
            indexed_at: Utc::now(),
            failed_embeddings,
        }
    }

    /// An indexed page that produced no text.
    pub fn empty(source_url: Option<String>) -> Self {
        Self::from_rows(source_url, Vec::new(), 0)
    }

    /// Pairs separately produced chunk and embedding lists, refusing any
    /// length mismatch.
    pub fn try_from_parts(
        chunks: Vec<TextChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, AppError> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Validation(format!(
                "chunk count {} does not match embedding count {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        Ok(Self::from_rows(None, chunks.into_iter().zip(embeddings), 0))
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn rows(&self) -> impl Iterator<Item = (&TextChunk, &[f32])> {
        self.chunks
            .iter()
            .zip(self.embeddings.iter().map(Vec::as_slice))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub const fn indexed_at(&self) -> DateTime<Utc> {
        self.indexed_at
    }

    pub const fn failed_embeddings(&self) -> usize {
        self.failed_embeddings
    }
}
