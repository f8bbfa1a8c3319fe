//! Axum route handlers for the Integrity API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::errors::AppError;
use crate::integrity::scoring::IntegritySample;
use crate::integrity::tracker::{FinalizedIntegrity, IntegrityUpdateResponse};
use crate::models::interview::InterviewId;
use crate::state::AppState;

/// POST /api/v1/interviews/:id/integrity
///
/// Folds one behavioral sample into the interview's running integrity score.
pub async fn handle_integrity_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<IntegritySample>, JsonRejection>,
) -> Result<Json<IntegrityUpdateResponse>, AppError> {
    let interview_id = InterviewId::parse(&id)?;
    let Json(sample) = payload?;
    Ok(Json(state.tracker.update(&interview_id, sample)))
}

/// POST /api/v1/interviews/:id/integrity/finalize
///
/// Ends tracking for the interview and returns its final integrity score.
pub async fn handle_integrity_finalize(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FinalizedIntegrity>, AppError> {
    let interview_id = InterviewId::parse(&id)?;
    Ok(Json(state.tracker.finalize(&interview_id)))
}
