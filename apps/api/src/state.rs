use std::sync::Arc;

use crate::evaluation::evaluator::AnswerEvaluator;
use crate::evaluation::repository::EvaluationRepository;
use crate::integrity::tracker::IntegrityTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live per-interview integrity state. Process-local.
    pub tracker: Arc<IntegrityTracker>,
    pub evaluator: Arc<AnswerEvaluator>,
    /// Evaluation store. Default: PgEvaluationRepository.
    pub evaluations: Arc<dyn EvaluationRepository>,
}
