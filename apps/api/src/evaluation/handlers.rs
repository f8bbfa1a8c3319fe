use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::evaluation::config::EvaluationOverrides;
use crate::evaluation::models::QaPair;
use crate::models::evaluation::StoredEvaluation;
use crate::models::interview::InterviewId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub qa_pairs: Vec<QaPair>,
    /// Final integrity score. When absent the live tracker is finalized
    /// for this interview and its score is used.
    #[serde(default)]
    pub integrity_aggregate: Option<f64>,
    #[serde(default)]
    pub config: Option<EvaluationOverrides>,
}

/// POST /api/v1/interviews/:id/evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredEvaluation>), AppError> {
    let interview_id = InterviewId::parse(&id)?;
    let Json(req) = payload?;
    if req.qa_pairs.is_empty() {
        return Err(AppError::Validation(
            "qaPairs must contain at least one question".to_string(),
        ));
    }

    // The tracker is only read here; its state is dropped once the result is
    // stored, so a failed evaluation can be retried against the same samples.
    let from_tracker = req.integrity_aggregate.is_none();
    let integrity = req
        .integrity_aggregate
        .unwrap_or_else(|| state.tracker.current_score(&interview_id));

    let evaluation = state
        .evaluator
        .evaluate(&req.qa_pairs, integrity, req.config.as_ref())
        .await?;

    let stored = state.evaluations.save(&interview_id, &evaluation).await?;
    if from_tracker {
        state.tracker.finalize(&interview_id);
    }
    info!(
        "Interview {interview_id} evaluated: {} ({} questions)",
        stored.evaluation.decision,
        req.qa_pairs.len()
    );

    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/interviews/:id/evaluation
pub async fn handle_get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredEvaluation>, AppError> {
    let interview_id = InterviewId::parse(&id)?;
    state
        .evaluations
        .latest(&interview_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No evaluation for interview {interview_id}")))
}
