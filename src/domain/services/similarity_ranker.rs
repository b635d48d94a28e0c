use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, warn};

use crate::domain::{Chunk, DomainError};

/// Cosine similarity of two equal-length vectors.
///
/// Zero magnitude on either side yields 0.0. The result is clamped to [-1, 1] so
/// rounding never reports a similarity above an exact match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(-1.0, 1.0) as f32
}

/// A candidate with its score and its position in the input sequence.
#[derive(Debug, Clone)]
pub struct Scored<C> {
    pub candidate: C,
    pub score: f32,
    pub position: usize,
}

/// Output of [`SimilarityRanker::rank`].
#[derive(Debug, Clone)]
pub struct Ranking<C> {
    pub hits: Vec<Scored<C>>,
    /// Candidates skipped because their dimensionality differed from the query's.
    pub skipped: usize,
}

/// Exact brute-force ranking over a candidate sequence.
pub struct SimilarityRanker;

impl SimilarityRanker {
    /// Scores every candidate against `query` and keeps the best `top_k`.
    ///
    /// Order is score descending, then input position ascending. Candidates whose
    /// embedding length differs from the query are skipped and counted.
    pub fn rank<C, I>(query: &[f32], candidates: I, top_k: usize) -> Ranking<C>
    where
        C: AsRef<Chunk>,
        I: IntoIterator<Item = C>,
    {
        let mut heap: BinaryHeap<HeapEntry<C>> = BinaryHeap::with_capacity(top_k + 1);
        let mut skipped = 0usize;

        for (position, candidate) in candidates.into_iter().enumerate() {
            let score = match Self::score(query, candidate.as_ref()) {
                Ok(score) => score,
                Err(e) => {
                    debug!("Skipping candidate: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            if top_k == 0 {
                continue;
            }

            heap.push(HeapEntry(Scored {
                candidate,
                score,
                position,
            }));
            if heap.len() > top_k {
                // Max of the heap is the worst entry under `rank_order`.
                heap.pop();
            }
        }

        if skipped > 0 {
            warn!(
                "Skipped {} candidates with mismatched embedding dimensions (query has {})",
                skipped,
                query.len()
            );
        }

        let hits = heap
            .into_sorted_vec()
            .into_iter()
            .map(|entry| entry.0)
            .collect();

        Ranking { hits, skipped }
    }

    /// Similarity of one candidate, or `DimensionMismatch` when lengths differ.
    pub fn score(query: &[f32], chunk: &Chunk) -> Result<f32, DomainError> {
        if chunk.dimensions() != query.len() {
            return Err(DomainError::dimension_mismatch(
                chunk.chunk_id(),
                query.len(),
                chunk.dimensions(),
            ));
        }
        Ok(cosine_similarity(query, chunk.embedding()))
    }
}

/// Better-ranked entries compare as `Less`.
fn rank_order(a_score: f32, a_pos: usize, b_score: f32, b_pos: usize) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a_pos.cmp(&b_pos))
}

struct HeapEntry<C>(Scored<C>);

impl<C> PartialEq for HeapEntry<C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C> Eq for HeapEntry<C> {}

impl<C> PartialOrd for HeapEntry<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for HeapEntry<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(self.0.score, self.0.position, other.0.score, other.0.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk::new(id, "doc", "text", 1, embedding)
    }

    fn ids<C: AsRef<Chunk>>(ranking: &Ranking<C>) -> Vec<String> {
        ranking
            .hits
            .iter()
            .map(|h| h.candidate.as_ref().chunk_id().to_string())
            .collect()
    }

    #[test]
    fn cosine_of_known_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
        let s = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((s - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn zero_magnitude_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn ranks_by_descending_score() {
        let candidates = vec![
            chunk("C", vec![-1.0, 0.0]),
            chunk("A", vec![1.0, 0.0]),
            chunk("B", vec![0.0, 1.0]),
        ];
        let ranking = SimilarityRanker::rank(&[1.0, 0.0], &candidates, 3);
        assert_eq!(ids(&ranking), vec!["A", "B", "C"]);
        let scores: Vec<f32> = ranking.hits.iter().map(|h| h.score).collect();
        assert_eq!(scores, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn ties_keep_input_order() {
        let candidates = vec![
            chunk("first", vec![2.0, 0.0]),
            chunk("second", vec![1.0, 0.0]),
            chunk("third", vec![3.0, 0.0]),
        ];
        let ranking = SimilarityRanker::rank(&[1.0, 0.0], &candidates, 2);
        assert_eq!(ids(&ranking), vec!["first", "second"]);
    }

    #[test]
    fn top_k_larger_than_candidates() {
        let candidates = vec![chunk("A", vec![1.0, 0.0])];
        let ranking = SimilarityRanker::rank(&[1.0, 0.0], &candidates, 10);
        assert_eq!(ranking.hits.len(), 1);
    }

    #[test]
    fn mismatched_dimensions_are_skipped_and_counted() {
        let candidates = vec![
            chunk("short", vec![1.0]),
            chunk("ok", vec![0.5, 0.5]),
            chunk("long", vec![1.0, 0.0, 0.0]),
        ];
        let ranking = SimilarityRanker::rank(&[1.0, 0.0], &candidates, 5);
        assert_eq!(ids(&ranking), vec!["ok"]);
        assert_eq!(ranking.skipped, 2);
    }

    #[test]
    fn score_reports_mismatch() {
        let err = SimilarityRanker::score(&[1.0, 0.0], &chunk("x", vec![1.0])).unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn zero_query_scores_every_candidate_zero() {
        let candidates = vec![chunk("A", vec![1.0, 0.0]), chunk("B", vec![0.0, 0.0])];
        let ranking = SimilarityRanker::rank(&[0.0, 0.0], &candidates, 2);
        assert!(ranking.hits.iter().all(|h| h.score == 0.0));
        assert_eq!(ids(&ranking), vec!["A", "B"]);
    }

    #[test]
    fn heap_selection_matches_full_sort() {
        let candidates: Vec<Chunk> = (0..50)
            .map(|i| {
                let angle = (i * 37 % 50) as f32 / 10.0;
                chunk(&format!("c{i}"), vec![angle.cos(), angle.sin()])
            })
            .collect();

        let full = SimilarityRanker::rank(&[1.0, 0.0], &candidates, candidates.len());
        let top = SimilarityRanker::rank(&[1.0, 0.0], &candidates, 7);
        assert_eq!(ids(&top), ids(&full)[..7].to_vec());
    }
}
