//! Persistence of finished evaluations.
//!
//! Append-only: re-evaluating an interview inserts a new row and reads
//! return the most recent one. Rows are never UPDATEd.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::models::InterviewEvaluation;
use crate::models::evaluation::{EvaluationRow, StoredEvaluation};
use crate::models::interview::InterviewId;

const EVALUATION_COLUMNS: &str = "id, interview_id, overall_score, content_aggregate, \
    comm_aggregate, integrity_aggregate, responsiveness_aggregate, per_question, flags, \
    decision, created_at";

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    async fn save(
        &self,
        interview_id: &InterviewId,
        evaluation: &InterviewEvaluation,
    ) -> Result<StoredEvaluation, AppError>;

    async fn latest(&self, interview_id: &InterviewId)
        -> Result<Option<StoredEvaluation>, AppError>;
}

pub struct PgEvaluationRepository {
    pool: PgPool,
}

impl PgEvaluationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationRepository for PgEvaluationRepository {
    async fn save(
        &self,
        interview_id: &InterviewId,
        evaluation: &InterviewEvaluation,
    ) -> Result<StoredEvaluation, AppError> {
        let row: EvaluationRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO interview_evaluations
                (id, interview_id, overall_score, content_aggregate, comm_aggregate,
                 integrity_aggregate, responsiveness_aggregate, per_question, flags,
                 decision, review_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVALUATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(interview_id.as_str())
        .bind(evaluation.overall_score)
        .bind(evaluation.content_aggregate)
        .bind(evaluation.comm_aggregate)
        .bind(evaluation.integrity_aggregate)
        .bind(evaluation.responsiveness_aggregate)
        .bind(Json(&evaluation.per_question))
        .bind(&evaluation.flags)
        .bind(evaluation.decision.as_str())
        .bind(evaluation.decision.as_review_status())
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Stored evaluation {} for interview {interview_id} (decision: {})",
            row.id, evaluation.decision
        );

        Ok(row.into_stored()?)
    }

    async fn latest(
        &self,
        interview_id: &InterviewId,
    ) -> Result<Option<StoredEvaluation>, AppError> {
        let row: Option<EvaluationRow> = sqlx::query_as(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM interview_evaluations \
             WHERE interview_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(interview_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EvaluationRow::into_stored).transpose()?)
    }
}

/// Process-local repository for router tests.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryEvaluationRepository {
    records: parking_lot::Mutex<Vec<StoredEvaluation>>,
}

#[cfg(test)]
#[async_trait]
impl EvaluationRepository for InMemoryEvaluationRepository {
    async fn save(
        &self,
        interview_id: &InterviewId,
        evaluation: &InterviewEvaluation,
    ) -> Result<StoredEvaluation, AppError> {
        let stored = StoredEvaluation {
            id: Uuid::new_v4(),
            interview_id: interview_id.clone(),
            created_at: chrono::Utc::now(),
            evaluation: evaluation.clone(),
        };
        self.records.lock().push(stored.clone());
        Ok(stored)
    }

    async fn latest(
        &self,
        interview_id: &InterviewId,
    ) -> Result<Option<StoredEvaluation>, AppError> {
        Ok(self
            .records
            .lock()
            .iter()
            .rev()
            .find(|r| &r.interview_id == interview_id)
            .cloned())
    }
}
