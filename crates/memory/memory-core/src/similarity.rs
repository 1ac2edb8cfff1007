//! Similarity scoring and ranking.
//!
//! Backends that scan their records locally score each candidate with [`cosine_similarity`]
//! and order the hits with [`rank`]. Backends that delegate search to a remote service still
//! run their converted scores through [`rank`] so every backend honours the same contract:
//! descending score, ties kept in candidate order, floor inclusive, at most `limit` results.

use crate::types::{MemoryRecord, SimilarityResult};

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// Returns 0.0 when either vector has zero magnitude or the vectors are empty.
/// Only the common prefix is compared when lengths differ; callers check dimensions first.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Filters `candidates` by `min_relevance_score` and orders them by descending score.
///
/// The sort is stable, so candidates with equal scores keep the order they were supplied in.
/// NaN scores never pass the floor.
pub fn rank<I>(candidates: I, limit: usize, min_relevance_score: f64) -> Vec<SimilarityResult>
where
    I: IntoIterator<Item = (MemoryRecord, f64)>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut hits: Vec<SimilarityResult> = candidates
        .into_iter()
        .filter(|(_, score)| *score >= min_relevance_score)
        .map(|(record, score)| SimilarityResult::new(record, score))
        .collect();

    hits.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    hits.truncate(limit);
    hits
}

/// Scores every candidate against `query` and ranks them with [`rank`].
pub fn top_matches<'a, I>(
    query: &[f32],
    candidates: I,
    limit: usize,
    min_relevance_score: f64,
) -> Vec<SimilarityResult>
where
    I: IntoIterator<Item = &'a MemoryRecord>,
{
    rank(
        candidates.into_iter().map(|record| {
            let score = cosine_similarity(query, &record.embedding);
            (record.clone(), score)
        }),
        limit,
        min_relevance_score,
    )
}
