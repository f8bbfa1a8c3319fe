use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::evaluation::models::{InterviewEvaluation, PerQuestionEvaluation};
use crate::models::interview::InterviewId;

/// Row of `interview_evaluations`. `review_status` is write-only from here
/// and deliberately left out of the selected columns.
#[derive(Debug, Clone, FromRow)]
pub struct EvaluationRow {
    pub id: Uuid,
    pub interview_id: String,
    pub overall_score: f64,
    pub content_aggregate: f64,
    pub comm_aggregate: f64,
    pub integrity_aggregate: f64,
    pub responsiveness_aggregate: f64,
    pub per_question: Json<Vec<PerQuestionEvaluation>>,
    pub flags: Vec<String>,
    pub decision: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted evaluation as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvaluation {
    pub id: Uuid,
    pub interview_id: InterviewId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub evaluation: InterviewEvaluation,
}

impl EvaluationRow {
    pub fn into_stored(self) -> Result<StoredEvaluation> {
        let interview_id = InterviewId::parse(&self.interview_id)?;
        let decision = self.decision.parse().map_err(anyhow::Error::msg)?;

        Ok(StoredEvaluation {
            id: self.id,
            interview_id,
            created_at: self.created_at,
            evaluation: InterviewEvaluation {
                overall_score: self.overall_score,
                content_aggregate: self.content_aggregate,
                comm_aggregate: self.comm_aggregate,
                integrity_aggregate: self.integrity_aggregate,
                responsiveness_aggregate: self.responsiveness_aggregate,
                per_question: self.per_question.0,
                flags: self.flags,
                decision,
            },
        })
    }
}
