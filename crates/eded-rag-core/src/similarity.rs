//! Pairwise and top-K aggregate similarity.
//!
//! # Top-K aggregate
//!
//! 1. Score every candidate against the query (cosine), in input order.
//! 2. Pick `K` from the candidate count `n`: `1` if `n ≤ 3`, `2` if
//!    `n ≤ 5`, else `3`.
//! 3. Take the `K` best-scoring candidates; ties go to the earlier one.
//! 4. Average their embeddings element-wise.
//! 5. The aggregate is the cosine between the query and that mean.
//!
//! The aggregate describes how well the query matches the best cluster of
//! retrieved evidence rather than any single passage.

use crate::embedding::cosine_similarity;
use crate::error::{EdedError, Result};

/// Number of candidates averaged into the aggregate for `n` candidates.
pub fn top_k_for(n: usize) -> usize {
    if n <= 3 {
        1
    } else if n <= 5 {
        2
    } else {
        3
    }
}

/// The aggregate over the best `k` candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct TopK {
    pub k: usize,
    /// Indices of the chosen candidates, best first.
    pub indices: Vec<usize>,
    pub similarity: f64,
}

/// Output of [`score_candidates`].
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScores {
    /// One score per candidate, in input order.
    pub scores: Vec<f64>,
    /// `None` iff there were no candidates.
    pub top_k: Option<TopK>,
}

/// Score candidates against a query and compute the top-K aggregate.
///
/// Every candidate must have the query's dimensionality; a mismatch is a
/// retrieval error rather than a silent zero score.
pub fn score_candidates(query: &[f32], candidates: &[Vec<f32>]) -> Result<CandidateScores> {
    if let Some((i, c)) = candidates
        .iter()
        .enumerate()
        .find(|(_, c)| c.len() != query.len())
    {
        return Err(EdedError::Retrieve(format!(
            "embedding dimension mismatch: query has {} dims, candidate {} has {}",
            query.len(),
            i,
            c.len()
        )));
    }

    let scores: Vec<f64> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    if candidates.is_empty() {
        return Ok(CandidateScores {
            scores,
            top_k: None,
        });
    }

    let k = top_k_for(candidates.len());
    let indices = top_indices(&scores, k);
    let chosen: Vec<&[f32]> = indices.iter().map(|&i| candidates[i].as_slice()).collect();
    let centroid = mean_vector(&chosen);

    Ok(CandidateScores {
        top_k: Some(TopK {
            k,
            similarity: cosine_similarity(query, &centroid),
            indices,
        }),
        scores,
    })
}

/// Indices of the `k` highest scores, best first; equal scores keep input
/// order.
pub fn top_indices(scores: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable sort: the earlier of two equal scores stays ahead.
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(k);
    order
}

/// Element-wise mean of equally sized vectors.
pub fn mean_vector(vectors: &[&[f32]]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let mut sum = vec![0.0f64; first.len()];
    for v in vectors {
        for (acc, &x) in sum.iter_mut().zip(v.iter()) {
            *acc += x as f64;
        }
    }
    let n = vectors.len() as f64;
    sum.into_iter().map(|s| (s / n) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_k_for_counts() {
        assert_eq!(top_k_for(1), 1);
        assert_eq!(top_k_for(2), 1);
        assert_eq!(top_k_for(3), 1);
        assert_eq!(top_k_for(4), 2);
        assert_eq!(top_k_for(5), 2);
        assert_eq!(top_k_for(6), 3);
        assert_eq!(top_k_for(10), 3);
    }

    #[test]
    fn test_empty_candidates() {
        let result = score_candidates(&[1.0, 0.0], &[]).unwrap();
        assert!(result.scores.is_empty());
        assert_eq!(result.top_k, None);
    }

    #[test]
    fn test_identical_candidates_aggregate_equals_pairwise() {
        let query = vec![1.0, 2.0, 0.5];
        let candidate = vec![0.3f32, 1.0, -0.7];
        for n in 1..=8 {
            let candidates = vec![candidate.clone(); n];
            let result = score_candidates(&query, &candidates).unwrap();
            let top = result.top_k.unwrap();
            assert_eq!(top.k, top_k_for(n));
            assert!((top.similarity - result.scores[0]).abs() < 1e-6, "n={}", n);
        }
    }

    #[test]
    fn test_k_one_uses_best_candidate_only() {
        // n = 3 → K = 1: aggregate equals the best pairwise score.
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.1], vec![1.0, 1.0]];
        let result = score_candidates(&query, &candidates).unwrap();
        let top = result.top_k.unwrap();
        assert_eq!(top.k, 1);
        assert_eq!(top.indices, vec![1]);
        assert!((top.similarity - result.scores[1]).abs() < 1e-9);
    }

    #[test]
    fn test_k_two_averages_best_pair() {
        // n = 4 → K = 2. Best two are the orthogonal unit axes e1 and e2;
        // their mean is (0.5, 0.5) and cos((1,1), (0.5,0.5)) = 1.
        let query = vec![1.0, 1.0];
        let candidates = vec![
            vec![1.0, 0.0],
            vec![-1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, -1.0],
        ];
        let result = score_candidates(&query, &candidates).unwrap();
        let top = result.top_k.unwrap();
        assert_eq!(top.k, 2);
        assert_eq!(top.indices, vec![0, 2]);
        assert!((top.similarity - 1.0).abs() < 1e-9);
        assert!((result.scores[0] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_k_three_with_six_candidates() {
        // Best three are e1, e2, e3 (score 1/√3 each); their mean points
        // along (1,1,1) so the aggregate is 1.
        let query = vec![1.0, 1.0, 1.0];
        let candidates = vec![
            vec![1.0, 0.0, 0.0],
            vec![-1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, -1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, -1.0],
        ];
        let result = score_candidates(&query, &candidates).unwrap();
        let top = result.top_k.unwrap();
        assert_eq!(top.k, 3);
        assert_eq!(top.indices, vec![0, 2, 4]);
        assert!((top.similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_prefer_first_seen() {
        assert_eq!(top_indices(&[0.5, 0.9, 0.9, 0.9], 2), vec![1, 2]);
        assert_eq!(top_indices(&[0.1, 0.1, 0.1], 1), vec![0]);
    }

    #[test]
    fn test_scores_in_input_order() {
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let result = score_candidates(&query, &candidates).unwrap();
        assert!(result.scores[0].abs() < 1e-9);
        assert!((result.scores[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let err = score_candidates(&[1.0, 0.0], &[vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, EdedError::Retrieve(_)));
    }

    #[test]
    fn test_mean_vector() {
        let a = [1.0f32, 3.0];
        let b = [3.0f32, 5.0];
        assert_eq!(mean_vector(&[&a, &b]), vec![2.0, 4.0]);
        assert!(mean_vector(&[]).is_empty());
    }
}
