use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One asked question and the candidate's answer, in interview order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    pub question: String,
    #[serde(default)]
    pub candidate_answer: Option<String>,
    #[serde(default)]
    pub reference_answer: Option<String>,
    #[serde(default)]
    pub importance: Option<f64>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub asked_at: Option<i64>,
    #[serde(default)]
    pub answered_at: Option<i64>,
}

impl QaPair {
    pub fn answer(&self) -> &str {
        self.candidate_answer.as_deref().unwrap_or("")
    }

    /// Reference answer, if one was provided and is not blank.
    pub fn reference(&self) -> Option<&str> {
        self.reference_answer
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }

    /// Importance weight; anything missing, zero, negative or non-finite counts as 1.
    pub fn weight(&self) -> f64 {
        match self.importance {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => 1.0,
        }
    }

    /// Answer latency in seconds, when both timestamps were recorded.
    pub fn latency_secs(&self) -> Option<f64> {
        match (self.asked_at, self.answered_at) {
            (Some(asked), Some(answered)) if asked != 0 && answered != 0 => {
                Some((answered - asked) as f64 / 1000.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerQuestionEvaluation {
    pub question_index: usize,
    pub content_score: f64,       // 0.0 – 1.0
    pub communication_score: f64, // 0.0 – 1.0
    pub final_score: f64,         // 0.0 – 1.0
    pub similarity: f64,          // raw semantic similarity
    pub keywords_matched: Vec<String>,
    pub keyword_coverage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_latency: Option<f64>, // seconds
    pub filler_rate: f64,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Advance,
    Maybe,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Advance => "advance",
            Decision::Maybe => "maybe",
            Decision::Reject => "reject",
        }
    }

    /// Maps onto the platform-wide review status (`advance | reject | review | pending`).
    /// `pending` is never produced here; it belongs to interviews not yet evaluated.
    pub fn as_review_status(&self) -> &'static str {
        match self {
            Decision::Advance => "advance",
            Decision::Maybe => "review",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "advance" => Ok(Decision::Advance),
            "maybe" => Ok(Decision::Maybe),
            "reject" => Ok(Decision::Reject),
            other => Err(format!("unknown decision '{other}'")),
        }
    }
}

/// Complete evaluation of one interview. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewEvaluation {
    pub overall_score: f64,
    pub content_aggregate: f64,
    pub comm_aggregate: f64,
    pub integrity_aggregate: f64,
    pub responsiveness_aggregate: f64,
    pub per_question: Vec<PerQuestionEvaluation>,
    pub flags: Vec<String>,
    pub decision: Decision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qa_pair_deserializes_with_only_required_fields() {
        let qa: QaPair = serde_json::from_str(
            r#"{"question": "What is ownership?", "candidateAnswer": null}"#,
        )
        .unwrap();
        assert_eq!(qa.answer(), "");
        assert!(qa.reference().is_none());
        assert_eq!(qa.weight(), 1.0);
        assert!(qa.latency_secs().is_none());
    }

    #[test]
    fn test_blank_reference_counts_as_missing() {
        let qa = QaPair {
            reference_answer: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(qa.reference().is_none());
    }

    #[test]
    fn test_weight_falls_back_to_one() {
        for importance in [Some(0.0), Some(-2.0), Some(f64::NAN), None] {
            let qa = QaPair {
                importance,
                ..Default::default()
            };
            assert_eq!(qa.weight(), 1.0);
        }
        let qa = QaPair {
            importance: Some(3.0),
            ..Default::default()
        };
        assert_eq!(qa.weight(), 3.0);
    }

    #[test]
    fn test_latency_requires_both_timestamps() {
        let qa = QaPair {
            asked_at: Some(1_000),
            answered_at: Some(4_500),
            ..Default::default()
        };
        assert_eq!(qa.latency_secs(), Some(3.5));

        let only_asked = QaPair {
            asked_at: Some(1_000),
            ..Default::default()
        };
        assert!(only_asked.latency_secs().is_none());
    }

    #[test]
    fn test_decision_wire_format() {
        assert_eq!(serde_json::to_string(&Decision::Advance).unwrap(), "\"advance\"");
        assert_eq!("maybe".parse::<Decision>().unwrap(), Decision::Maybe);
        assert!("review".parse::<Decision>().is_err());
    }

    #[test]
    fn test_review_status_mapping() {
        assert_eq!(Decision::Advance.as_review_status(), "advance");
        assert_eq!(Decision::Maybe.as_review_status(), "review");
        assert_eq!(Decision::Reject.as_review_status(), "reject");
    }

    #[test]
    fn test_latency_omitted_from_json_when_absent() {
        let pq = PerQuestionEvaluation {
            question_index: 0,
            content_score: 0.5,
            communication_score: 0.5,
            final_score: 0.5,
            similarity: 0.5,
            keywords_matched: vec![],
            keyword_coverage: 0.0,
            response_latency: None,
            filler_rate: 0.0,
            notes: vec![],
        };
        let json = serde_json::to_value(&pq).unwrap();
        assert!(json.get("responseLatency").is_none());
        assert_eq!(json["questionIndex"], 0);
    }
}
