//! Interview answer evaluator.
//!
//! Scores each question on content (semantic similarity, keyword coverage,
//! answer length) and communication (filler words, response latency), then
//! combines the importance-weighted aggregates with the finalized integrity
//! score into an `advance | maybe | reject` decision.
//!
//! Similarity lookups are the only I/O. They run concurrently up to
//! `max_concurrent_similarity` and are reassembled in question order; the
//! first failure aborts the rest.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::evaluation::config::{EvaluationConfig, EvaluationOverrides};
use crate::evaluation::models::{Decision, InterviewEvaluation, PerQuestionEvaluation, QaPair};
use crate::evaluation::similarity::{SimilarityError, SimilarityScorer};
use crate::evaluation::text::{filler_stats, keyword_coverage, word_count};

/// Similarity assumed when a question has no reference answer.
pub const NEUTRAL_SIMILARITY: f64 = 0.5;

/// Filler rate at which the filler component of communication bottoms out.
const FILLER_RATE_CEILING: f64 = 0.05;
/// Pause detection needs word-level timings, which answers do not carry yet.
const PAUSE_SCORE: f64 = 1.0;

const INTEGRITY_VETO: f64 = 0.3;
const ADVANCE_MIN_OVERALL_PCT: f64 = 75.0;
const ADVANCE_MIN_INTEGRITY: f64 = 0.6;
const MAYBE_MIN_OVERALL_PCT: f64 = 60.0;
const LOW_INTEGRITY_FLAG: f64 = 0.5;
const LOW_COVERAGE_NOTE: f64 = 0.5;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("similarity lookup failed for question {question_index}: {source}")]
    Similarity {
        question_index: usize,
        source: SimilarityError,
    },

    #[error("similarity lookup for question {question_index} timed out after {timeout:?}")]
    SimilarityTimeout {
        question_index: usize,
        timeout: Duration,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub struct AnswerEvaluator {
    scorer: Arc<dyn SimilarityScorer>,
    config: EvaluationConfig,
}

/// Unrounded scores kept for aggregation next to the rounded, reported evaluation.
struct ScoredQuestion {
    importance: f64,
    content: f64,
    comm: f64,
    latency_score: f64,
    evaluation: PerQuestionEvaluation,
}

impl AnswerEvaluator {
    pub fn new(scorer: Arc<dyn SimilarityScorer>, config: EvaluationConfig) -> Self {
        Self { scorer, config }
    }

    /// Evaluates a finished interview. `integrity_aggregate` is the tracker's final score.
    pub async fn evaluate(
        &self,
        qa_pairs: &[QaPair],
        integrity_aggregate: f64,
        overrides: Option<&EvaluationOverrides>,
    ) -> Result<InterviewEvaluation, EvaluationError> {
        if !integrity_aggregate.is_finite() {
            return Err(EvaluationError::InvalidInput(format!(
                "integrity aggregate must be a finite number, got {integrity_aggregate}"
            )));
        }
        let integrity = integrity_aggregate.clamp(0.0, 1.0);
        let cfg = self.config.merged(overrides);

        let similarities = self.similarities(qa_pairs, &cfg).await?;

        let scored: Vec<ScoredQuestion> = qa_pairs
            .iter()
            .zip(similarities)
            .enumerate()
            .map(|(i, (qa, sim))| score_question(i, qa, sim, &cfg))
            .collect();

        let total_importance: f64 = scored.iter().map(|q| q.importance).sum();
        let weighted_mean = |score: fn(&ScoredQuestion) -> f64| {
            scored.iter().map(|q| score(q) * q.importance).sum::<f64>()
                / total_importance.max(1e-9)
        };
        let content_aggregate = weighted_mean(|q| q.content);
        let comm_aggregate = weighted_mean(|q| q.comm);
        let responsiveness_aggregate = weighted_mean(|q| q.latency_score);

        let w = cfg.weights;
        let overall = w.content * content_aggregate
            + w.comm * comm_aggregate
            + w.integrity * integrity
            + w.resp * responsiveness_aggregate;

        let decision = decide(overall, integrity);
        let flags = collect_flags(integrity, qa_pairs);

        info!(
            "Evaluated {} questions: overall={overall:.3} integrity={integrity:.3} decision={decision} flags={flags:?}",
            qa_pairs.len()
        );

        Ok(InterviewEvaluation {
            overall_score: round3(overall),
            content_aggregate: round3(content_aggregate),
            comm_aggregate: round3(comm_aggregate),
            integrity_aggregate: round3(integrity),
            responsiveness_aggregate: round3(responsiveness_aggregate),
            per_question: scored.into_iter().map(|q| q.evaluation).collect(),
            flags,
            decision,
        })
    }

    /// One similarity per question, in input order.
    async fn similarities(
        &self,
        qa_pairs: &[QaPair],
        cfg: &EvaluationConfig,
    ) -> Result<Vec<f64>, EvaluationError> {
        // Boxed before buffering so the evaluate future stays `Send`.
        let lookups: Vec<_> = qa_pairs
            .iter()
            .enumerate()
            .map(|(i, qa)| self.similarity_for(i, qa, cfg.similarity_timeout).boxed())
            .collect();

        stream::iter(lookups)
            .buffered(cfg.max_concurrent_similarity.max(1))
            .try_collect()
            .await
    }

    async fn similarity_for(
        &self,
        question_index: usize,
        qa: &QaPair,
        timeout: Duration,
    ) -> Result<f64, EvaluationError> {
        let Some(reference) = qa.reference() else {
            return Ok(NEUTRAL_SIMILARITY);
        };
        let answer = qa.answer();
        if answer.trim().is_empty() {
            return Ok(0.0);
        }

        match tokio::time::timeout(timeout, self.scorer.similarity(answer, reference)).await {
            Ok(Ok(sim)) => Ok(if sim.is_nan() { 0.0 } else { sim.clamp(0.0, 1.0) }),
            Ok(Err(source)) => {
                warn!("Similarity lookup failed for question {question_index}: {source}");
                Err(EvaluationError::Similarity {
                    question_index,
                    source,
                })
            }
            Err(_) => {
                warn!("Similarity lookup for question {question_index} timed out after {timeout:?}");
                Err(EvaluationError::SimilarityTimeout {
                    question_index,
                    timeout,
                })
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-question scoring
// ────────────────────────────────────────────────────────────────────────────

fn score_question(
    index: usize,
    qa: &QaPair,
    similarity: f64,
    cfg: &EvaluationConfig,
) -> ScoredQuestion {
    let answer = qa.answer();

    let keywords = keyword_coverage(answer, cfg.keywords_for(index));
    let candidate_words = word_count(answer);
    let reference_words = qa
        .reference()
        .map(word_count)
        .unwrap_or(candidate_words)
        .max(1);
    let len_ratio = (candidate_words as f64 / reference_words as f64).min(1.0);
    let content = 0.6 * similarity + 0.3 * keywords.coverage + 0.1 * len_ratio;

    let fillers = filler_stats(answer);
    let latency = qa.latency_secs();
    let responsiveness = latency
        .map(|secs| latency_score(secs, cfg.max_latency_seconds))
        .unwrap_or(1.0);
    let comm = 0.5 * (1.0 - (fillers.filler_rate / FILLER_RATE_CEILING).min(1.0))
        + 0.3 * PAUSE_SCORE
        + 0.2 * responsiveness;

    let final_score = 0.75 * content + 0.25 * comm;

    let mut notes = Vec::new();
    if answer.trim().is_empty() {
        notes.push("No answer given.".to_string());
    }
    if qa.reference().is_none() {
        notes.push("No reference answer; similarity scored as neutral.".to_string());
    }
    let expected = cfg.keywords_for(index);
    if !expected.is_empty() && keywords.coverage < LOW_COVERAGE_NOTE {
        let missing: Vec<&str> = expected
            .iter()
            .filter(|kw| !keywords.matched.contains(*kw))
            .map(String::as_str)
            .collect();
        notes.push(format!("Missing expected keywords: {}.", missing.join(", ")));
    }
    if fillers.filler_rate > FILLER_RATE_CEILING {
        notes.push(format!(
            "Frequent filler words ({} of {} words).",
            fillers.fillers, fillers.total_words
        ));
    }
    if let Some(secs) = latency.filter(|s| *s > cfg.max_latency_seconds) {
        notes.push(format!("Slow to respond ({secs:.1}s)."));
    }

    ScoredQuestion {
        importance: qa.weight(),
        content,
        comm,
        latency_score: responsiveness,
        evaluation: PerQuestionEvaluation {
            question_index: index,
            content_score: round3(content),
            communication_score: round3(comm),
            final_score: round3(final_score),
            similarity: round3(similarity),
            keywords_matched: keywords.matched,
            keyword_coverage: round3(keywords.coverage),
            response_latency: latency,
            filler_rate: round3(fillers.filler_rate),
            notes,
        },
    }
}

/// Linear decay from 1 at zero latency to 0 at `max_latency_seconds`.
pub fn latency_score(latency_secs: f64, max_latency_seconds: f64) -> f64 {
    1.0 - (latency_secs.max(0.0) / max_latency_seconds).min(1.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Decision
// ────────────────────────────────────────────────────────────────────────────

/// First match wins: integrity veto, then advance, then maybe.
pub fn decide(overall: f64, integrity: f64) -> Decision {
    let overall_pct = overall * 100.0;
    if integrity < INTEGRITY_VETO {
        Decision::Reject
    } else if overall_pct >= ADVANCE_MIN_OVERALL_PCT && integrity >= ADVANCE_MIN_INTEGRITY {
        Decision::Advance
    } else if overall_pct >= MAYBE_MIN_OVERALL_PCT {
        Decision::Maybe
    } else {
        Decision::Reject
    }
}

fn collect_flags(integrity: f64, qa_pairs: &[QaPair]) -> Vec<String> {
    let mut flags = Vec::new();
    if integrity < LOW_INTEGRITY_FLAG {
        flags.push("low_integrity".to_string());
    }
    if !qa_pairs.is_empty() && qa_pairs.iter().all(|qa| qa.reference().is_none()) {
        flags.push("no_reference_answers".to_string());
    }
    if qa_pairs.iter().any(|qa| qa.answer().trim().is_empty()) {
        flags.push("empty_answers".to_string());
    }
    flags
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
