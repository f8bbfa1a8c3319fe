use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Weights of the four aggregates in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub content: f64,
    pub comm: f64,
    pub integrity: f64,
    pub resp: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            content: 0.6,
            comm: 0.15,
            integrity: 0.15,
            resp: 0.1,
        }
    }
}

/// Evaluator settings. `Default` holds the production values; callers adjust
/// per evaluation through [`EvaluationOverrides`].
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Expected keywords per question index.
    pub question_keywords: HashMap<usize, Vec<String>>,
    /// Latency at which the responsiveness score reaches 0.
    pub max_latency_seconds: f64,
    pub weights: ScoreWeights,
    /// Upper bound on in-flight similarity requests per evaluation.
    pub max_concurrent_similarity: usize,
    pub similarity_timeout: Duration,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            question_keywords: HashMap::new(),
            max_latency_seconds: 8.0,
            weights: ScoreWeights::default(),
            max_concurrent_similarity: 4,
            similarity_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightOverrides {
    pub content: Option<f64>,
    pub comm: Option<f64>,
    pub integrity: Option<f64>,
    pub resp: Option<f64>,
}

/// Caller-supplied adjustments, merged field by field over the base config.
/// Unknown keys (such as `maxPauseSeconds`, which needs word timings the
/// answers do not carry) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOverrides {
    #[serde(default)]
    pub question_keywords: Option<HashMap<usize, Vec<String>>>,
    #[serde(default)]
    pub max_latency_seconds: Option<f64>,
    #[serde(default)]
    pub weights: Option<WeightOverrides>,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn weight(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

impl EvaluationConfig {
    /// Returns a copy with `overrides` applied. Invalid numbers (non-finite,
    /// non-positive limits, negative weights) are ignored in favour of the base value.
    pub fn merged(&self, overrides: Option<&EvaluationOverrides>) -> EvaluationConfig {
        let Some(o) = overrides else {
            return self.clone();
        };

        let w = o.weights.clone().unwrap_or_default();
        EvaluationConfig {
            question_keywords: o
                .question_keywords
                .clone()
                .unwrap_or_else(|| self.question_keywords.clone()),
            max_latency_seconds: positive(o.max_latency_seconds).unwrap_or(self.max_latency_seconds),
            weights: ScoreWeights {
                content: weight(w.content).unwrap_or(self.weights.content),
                comm: weight(w.comm).unwrap_or(self.weights.comm),
                integrity: weight(w.integrity).unwrap_or(self.weights.integrity),
                resp: weight(w.resp).unwrap_or(self.weights.resp),
            },
            max_concurrent_similarity: self.max_concurrent_similarity,
            similarity_timeout: self.similarity_timeout,
        }
    }

    pub fn keywords_for(&self, question_index: usize) -> &[String] {
        self.question_keywords
            .get(&question_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EvaluationConfig::default();
        assert_eq!(cfg.max_latency_seconds, 8.0);
        assert_eq!(cfg.weights, ScoreWeights::default());
        assert!(cfg.keywords_for(0).is_empty());
    }

    #[test]
    fn test_no_overrides_returns_base() {
        let cfg = EvaluationConfig::default();
        assert_eq!(cfg.merged(None), cfg);
    }

    #[test]
    fn test_partial_weight_override_keeps_other_defaults() {
        let overrides = EvaluationOverrides {
            weights: Some(WeightOverrides {
                integrity: Some(0.3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = EvaluationConfig::default().merged(Some(&overrides));
        assert_eq!(cfg.weights.integrity, 0.3);
        assert_eq!(cfg.weights.content, 0.6);
        assert_eq!(cfg.weights.comm, 0.15);
        assert_eq!(cfg.weights.resp, 0.1);
    }

    #[test]
    fn test_invalid_override_values_are_ignored() {
        let overrides = EvaluationOverrides {
            max_latency_seconds: Some(0.0),
            weights: Some(WeightOverrides {
                content: Some(-1.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = EvaluationConfig::default().merged(Some(&overrides));
        assert_eq!(cfg.max_latency_seconds, 8.0);
        assert_eq!(cfg.weights.content, 0.6);
    }

    #[test]
    fn test_overrides_deserialize_with_string_index_keys() {
        let overrides: EvaluationOverrides = serde_json::from_str(
            r#"{"questionKeywords": {"1": ["docker", "aws"]}, "maxLatencySeconds": 12}"#,
        )
        .unwrap();
        let cfg = EvaluationConfig::default().merged(Some(&overrides));
        assert_eq!(cfg.keywords_for(1), ["docker".to_string(), "aws".to_string()]);
        assert!(cfg.keywords_for(0).is_empty());
        assert_eq!(cfg.max_latency_seconds, 12.0);
    }

    #[test]
    fn test_pause_override_is_accepted_and_ignored() {
        let overrides: EvaluationOverrides =
            serde_json::from_str(r#"{"maxPauseSeconds": 2, "maxLatencySeconds": 6}"#).unwrap();
        let cfg = EvaluationConfig::default().merged(Some(&overrides));
        assert_eq!(cfg.max_latency_seconds, 6.0);
        assert_eq!(cfg.weights, ScoreWeights::default());
    }
}
