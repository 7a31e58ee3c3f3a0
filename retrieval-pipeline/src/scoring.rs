use std::cmp::Ordering;

use common::storage::types::{site_index::SiteIndex, text_chunk::TextChunk};

use crate::RetrievedChunk;

/// Wraps an item with its similarity to the query. `None` means the
/// similarity is undefined (zero norm, dimension mismatch or non-finite input).
#[derive(Debug, Clone)]
pub struct Scored<T> {
    pub item: T,
    pub similarity: Option<f32>,
}

impl<T> Scored<T> {
    pub const fn new(item: T, similarity: Option<f32>) -> Self {
        Self { item, similarity }
    }

    /// Undefined similarity counts as zero wherever a number is reported.
    pub fn score(&self) -> f32 {
        self.similarity.unwrap_or(0.0)
    }
}

/// Cosine similarity between two vectors, or `None` when it is undefined.
///
/// A zero-norm vector on either side yields `None` instead of dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
        return None;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot = x.mul_add(*y, dot);
        norm_a = x.mul_add(*x, norm_a);
        norm_b = y.mul_add(*y, norm_b);
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return None;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    similarity.is_finite().then(|| similarity.clamp(-1.0, 1.0))
}

/// Ranking order: defined similarities before undefined ones, higher
/// similarity first, then ascending document position.
fn compare_ranked(a: &Scored<&TextChunk>, b: &Scored<&TextChunk>) -> Ordering {
    match (a.similarity, b.similarity) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.item.position.cmp(&b.item.position))
}

/// Linear scan over every row of `index`, returning at most `k` chunks
/// ordered from most to least similar to `query`.
pub fn rank_chunks(index: &SiteIndex, query: &[f32], k: usize) -> Vec<RetrievedChunk> {
    if k == 0 || index.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<Scored<&TextChunk>> = index
        .rows()
        .map(|(chunk, embedding)| Scored::new(chunk, cosine_similarity(query, embedding)))
        .collect();

    scored.sort_by(compare_ranked);
    scored.truncate(k);

    scored
        .into_iter()
        .map(|scored| RetrievedChunk {
            score: scored.score(),
            chunk: scored.item.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_from(embeddings: Vec<Vec<f32>>) -> SiteIndex {
        let rows = embeddings
            .into_iter()
            .enumerate()
            .map(|(i, e)| (TextChunk::new(i, format!("chunk {i}")), e));
        SiteIndex::from_rows(None, rows, 0)
    }

    fn positions(results: &[RetrievedChunk]) -> Vec<usize> {
        results.iter().map(|r| r.chunk.position).collect()
    }

    #[test]
    fn cosine_of_identical_and_orthogonal_vectors() {
        let same = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).expect("defined");
        assert!((same - 1.0).abs() < 1e-6);

        let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("defined");
        assert!(orthogonal.abs() < 1e-6);

        let opposite = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).expect("defined");
        assert!((opposite + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_is_undefined_for_zero_norm_and_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn top_three_of_five_puts_best_chunk_first() {
        let index = index_from(vec![
            vec![0.0, 1.0, 0.0],
            vec![0.5, 0.5, 0.0],
            vec![1.0, 0.05, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.8, 0.6, 0.0],
        ]);

        let results = rank_chunks(&index, &[1.0, 0.0, 0.0], 3);

        assert_eq!(results.len(), 3);
        assert_eq!(positions(&results), vec![2, 4, 1]);
        assert!(results.windows(2).all(|w| match w {
            [a, b] => a.score >= b.score,
            _ => true,
        }));
    }

    #[test]
    fn k_is_capped_at_available_chunks() {
        let index = index_from(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(rank_chunks(&index, &[1.0, 0.0], 10).len(), 2);
        assert!(rank_chunks(&index, &[1.0, 0.0], 0).is_empty());
    }

    #[test]
    fn ties_break_by_ascending_position() {
        let index = index_from(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
        ]);

        let results = rank_chunks(&index, &[1.0, 0.0], 2);
        assert_eq!(positions(&results), vec![1, 2]);
    }

    #[test]
    fn zero_vector_placeholder_ranks_below_negative_similarity() {
        let index = index_from(vec![vec![0.0, 0.0], vec![-1.0, 0.0], vec![1.0, 0.0]]);

        let results = rank_chunks(&index, &[1.0, 0.0], 3);

        assert_eq!(positions(&results), vec![2, 1, 0]);
        assert_eq!(results.last().map(|r| r.score), Some(0.0));
    }

    #[test]
    fn zero_query_vector_never_panics() {
        let index = index_from(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let results = rank_chunks(&index, &[0.0, 0.0], 2);

        assert_eq!(positions(&results), vec![0, 1]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }
}
