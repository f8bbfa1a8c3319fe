//! Pure scoring helpers for behavioral integrity samples.
//!
//! Nothing here touches tracker state. The tracker feeds samples and
//! accumulated averages through these functions and owns the bookkeeping.

use serde::{Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// One behavioral measurement from the capture pipeline, roughly once per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegritySample {
    #[serde(deserialize_with = "lenient_face_count")]
    pub face_count: u32,
    pub eye_contact: f64, // 0.0 – 1.0
    pub speaking: f64,    // 0.0 – 1.0
    pub blink_rate: f64,  // blinks per second
}

/// Detectors occasionally report averaged or negative counts. Round to the
/// nearest whole face and clamp instead of rejecting the sample.
fn lenient_face_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Ok(0);
    }
    Ok(raw.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Relative weight of each signal in every combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub face: f64,
    pub gaze: f64,
    pub speak: f64,
    pub blink: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            face: 2.0,
            gaze: 1.0,
            speak: 1.0,
            blink: 1.0,
        }
    }
}

impl SignalWeights {
    fn total(&self) -> f64 {
        self.face + self.gaze + self.speak + self.blink
    }
}

/// Tuning for the integrity tracker. `Default` carries the production values.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityConfig {
    pub weights: SignalWeights,
    /// EWMA smoothing factor; smaller = smoother.
    pub ewma_alpha: f64,
    /// Physiological baseline in blinks/sec. Deviation either way is penalized.
    pub normal_blink_rate: f64,
    /// Gaze sub-score below this counts towards low-eye-contact time.
    pub low_gaze_threshold: f64,
    pub multiple_face_violation_secs: f64,
    pub absent_violation_secs: f64,
    pub low_gaze_violation_secs: f64,
    /// Absence beyond this many seconds voids the aggregate score.
    pub absent_override_secs: f64,
    pub absent_penalty: f64,
    /// Multiplier applied per minute of multiple-face presence.
    pub multiple_face_penalty_per_min: f64,
    pub low_gaze_penalty_factor: f64,
    /// Final score reported when an interview never produced a sample.
    pub no_data_score: f64,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            ewma_alpha: 0.18,
            normal_blink_rate: 0.08,
            low_gaze_threshold: 0.4,
            multiple_face_violation_secs: 3.0,
            absent_violation_secs: 3.0,
            low_gaze_violation_secs: 10.0,
            absent_override_secs: 5.0,
            absent_penalty: 0.0,
            multiple_face_penalty_per_min: 0.5,
            low_gaze_penalty_factor: 0.6,
            no_data_score: 1.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-scores
// ────────────────────────────────────────────────────────────────────────────

/// Clamps into [0, 1]. NaN maps to 0 so malformed input can never escape the bounds.
pub fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One face is ideal, none is absent, more than one splits the credit.
pub fn face_score(face_count: u32) -> f64 {
    match face_count {
        0 => 0.0,
        1 => 1.0,
        n => 1.0 / f64::from(n),
    }
}

pub fn blink_score(blink_rate: f64, normal_rate: f64) -> f64 {
    unit(1.0 - (blink_rate - normal_rate).abs() / normal_rate)
}

/// The four per-signal scores, each in [0, 1].
///
/// Used for instantaneous values, time-weighted averages and EWMAs alike,
/// so the weighting lives in one place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubScores {
    pub face: f64,
    pub gaze: f64,
    pub speak: f64,
    pub blink: f64,
}

impl SubScores {
    pub fn from_sample(sample: &IntegritySample, config: &IntegrityConfig) -> Self {
        Self {
            face: face_score(sample.face_count),
            gaze: unit(sample.eye_contact),
            speak: unit(sample.speaking),
            blink: blink_score(sample.blink_rate, config.normal_blink_rate),
        }
    }

    /// Weighted mean of the four signals, clamped to [0, 1].
    pub fn combined(&self, weights: &SignalWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        unit(
            (weights.face * self.face
                + weights.gaze * self.gaze
                + weights.speak * self.speak
                + weights.blink * self.blink)
                / total,
        )
    }
}

/// Score of a single sample in isolation.
pub fn instant_score(sample: &IntegritySample, config: &IntegrityConfig) -> f64 {
    SubScores::from_sample(sample, config).combined(&config.weights)
}

// ────────────────────────────────────────────────────────────────────────────
// Penalties
// ────────────────────────────────────────────────────────────────────────────

/// Exponential decay multiplier for time spent with more than one face on camera.
/// `per_minute` is the factor after one full minute: 60s → 0.5, 120s → 0.25 by default.
pub fn multi_face_penalty(multiple_face_seconds: f64, per_minute: f64) -> f64 {
    if multiple_face_seconds <= 0.0 {
        return 1.0;
    }
    per_minute.powf(multiple_face_seconds / 60.0)
}

/// Accumulated violation state the penalties are computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PenaltyInputs {
    pub absent_seconds: f64,
    pub multiple_face_seconds: f64,
    pub low_eye_contact_violated: bool,
}

/// Applies violation penalties to a time-weighted aggregate.
///
/// Sustained absence overrides everything. Otherwise the multiple-face decay
/// and the low-gaze factor compose multiplicatively.
pub fn apply_penalties(aggregate: f64, inputs: &PenaltyInputs, config: &IntegrityConfig) -> f64 {
    if inputs.absent_seconds > config.absent_override_secs {
        return unit(config.absent_penalty);
    }

    let mut score = aggregate;
    if inputs.multiple_face_seconds > 0.0 {
        score *= multi_face_penalty(
            inputs.multiple_face_seconds,
            config.multiple_face_penalty_per_min,
        );
    }
    if inputs.low_eye_contact_violated {
        score *= config.low_gaze_penalty_factor;
    }
    unit(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(face_count: u32, eye_contact: f64, speaking: f64, blink_rate: f64) -> IntegritySample {
        IntegritySample {
            face_count,
            eye_contact,
            speaking,
            blink_rate,
        }
    }

    #[test]
    fn test_face_count_is_rounded_and_clamped() {
        let parse = |raw: &str| -> IntegritySample {
            serde_json::from_str(&format!(
                r#"{{"faceCount": {raw}, "eyeContact": 1.0, "speaking": 1.0, "blinkRate": 0.08}}"#
            ))
            .unwrap()
        };
        assert_eq!(parse("1").face_count, 1);
        assert_eq!(parse("-2").face_count, 0);
        assert_eq!(parse("1.4").face_count, 1);
        assert_eq!(parse("2.6").face_count, 3);
        assert_eq!(parse("1e12").face_count, u32::MAX);
    }

    #[test]
    fn test_face_score_levels() {
        assert_eq!(face_score(0), 0.0);
        assert_eq!(face_score(1), 1.0);
        assert_eq!(face_score(2), 0.5);
        assert_eq!(face_score(4), 0.25);
    }

    #[test]
    fn test_blink_score_is_symmetric_around_baseline() {
        assert_eq!(blink_score(0.08, 0.08), 1.0);
        let low = blink_score(0.04, 0.08);
        let high = blink_score(0.12, 0.08);
        assert!((low - 0.5).abs() < 1e-9, "low was {low}");
        assert!((high - 0.5).abs() < 1e-9, "high was {high}");
        assert_eq!(blink_score(0.0, 0.08), 0.0);
        assert_eq!(blink_score(1.0, 0.08), 0.0);
    }

    #[test]
    fn test_instant_score_perfect_sample() {
        let cfg = IntegrityConfig::default();
        assert_eq!(instant_score(&sample(1, 1.0, 1.0, 0.08), &cfg), 1.0);
    }

    #[test]
    fn test_instant_score_face_has_double_weight() {
        let cfg = IntegrityConfig::default();
        // (2*0 + 1 + 1 + 1) / 5
        let absent = instant_score(&sample(0, 1.0, 1.0, 0.08), &cfg);
        assert!((absent - 0.6).abs() < 1e-9, "Score was {absent}");
        // (2*1 + 0 + 1 + 1) / 5
        let no_gaze = instant_score(&sample(1, 0.0, 1.0, 0.08), &cfg);
        assert!((no_gaze - 0.8).abs() < 1e-9, "Score was {no_gaze}");
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let cfg = IntegrityConfig::default();
        let s = SubScores::from_sample(&sample(1, 3.5, -2.0, f64::NAN), &cfg);
        assert_eq!(s.gaze, 1.0);
        assert_eq!(s.speak, 0.0);
        assert_eq!(s.blink, 0.0);
        assert_eq!(instant_score(&sample(1, f64::INFINITY, f64::NAN, -1.0), &cfg), 0.6);
    }

    #[test]
    fn test_multi_face_penalty_halves_per_minute() {
        assert_eq!(multi_face_penalty(0.0, 0.5), 1.0);
        assert_eq!(multi_face_penalty(60.0, 0.5), 0.5);
        assert_eq!(multi_face_penalty(120.0, 0.5), 0.25);
        let half_minute = multi_face_penalty(30.0, 0.5);
        assert!((half_minute - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_absence_override_wins_over_other_penalties() {
        let cfg = IntegrityConfig::default();
        let inputs = PenaltyInputs {
            absent_seconds: 5.5,
            multiple_face_seconds: 0.0,
            low_eye_contact_violated: false,
        };
        assert_eq!(apply_penalties(0.95, &inputs, &cfg), 0.0);
    }

    #[test]
    fn test_absence_at_threshold_does_not_override() {
        let cfg = IntegrityConfig::default();
        let inputs = PenaltyInputs {
            absent_seconds: 5.0,
            ..Default::default()
        };
        assert_eq!(apply_penalties(0.9, &inputs, &cfg), 0.9);
    }

    #[test]
    fn test_penalties_compose_multiplicatively() {
        let cfg = IntegrityConfig::default();
        let inputs = PenaltyInputs {
            absent_seconds: 1.0,
            multiple_face_seconds: 60.0,
            low_eye_contact_violated: true,
        };
        // 0.8 * 0.5 * 0.6
        let score = apply_penalties(0.8, &inputs, &cfg);
        assert!((score - 0.24).abs() < 1e-9, "Score was {score}");
    }
}
