//! Semantic similarity: a pluggable scorer comparing a candidate
//! answer against the reference answer.
//!
//! Default: `EmbeddingSimilarity` (cosine similarity of embedding vectors).
//!
//! `AnswerEvaluator` holds an `Arc<dyn SimilarityScorer>`, so tests and
//! alternative backends swap in without touching the evaluator.

use async_trait::async_trait;
use thiserror::Error;

use crate::embedding_client::{EmbeddingClient, EmbeddingError};

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("embedding request failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding dimensions differ ({left} vs {right})")]
    DimensionMismatch { left: usize, right: usize },
}

/// Similarity backend. Implementations return a score in [0, 1]; the evaluator
/// clamps anyway.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    async fn similarity(&self, candidate: &str, reference: &str) -> Result<f64, SimilarityError>;
}

// ────────────────────────────────────────────────────────────────────────────
// EmbeddingSimilarity (default backend)
// ────────────────────────────────────────────────────────────────────────────

/// Embeds both texts in a single request and compares them by cosine.
/// Negative cosines (opposed meaning) floor at 0.
pub struct EmbeddingSimilarity(pub EmbeddingClient);

#[async_trait]
impl SimilarityScorer for EmbeddingSimilarity {
    async fn similarity(&self, candidate: &str, reference: &str) -> Result<f64, SimilarityError> {
        let vectors = self.0.embed(&[candidate, reference]).await?;
        match vectors.as_slice() {
            [a, b] => Ok(cosine_similarity(a, b)?.clamp(0.0, 1.0)),
            other => Err(SimilarityError::Embedding(EmbeddingError::CountMismatch {
                expected: 2,
                got: other.len(),
            })),
        }
    }
}

/// Cosine of the angle between two vectors; 0 when either has zero length.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_score_one() {
        let v = [0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_opposite_vectors_score_minus_one() {
        let s = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((s + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        assert!(matches!(
            cosine_similarity(&[1.0], &[1.0, 2.0]),
            Err(SimilarityError::DimensionMismatch { left: 1, right: 2 })
        ));
    }
}
