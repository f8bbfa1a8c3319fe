//! Streaming integrity tracker. One accumulator per live interview.
//!
//! Samples are folded into time-weighted sums, per-signal EWMAs and
//! violation counters. Every update returns the current bounded score;
//! `finalize` computes the session score and drops the state.
//!
//! The state map sits behind a single lock, so updates for the same
//! interview are serialized. Each tracker instance owns its own map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::integrity::scoring::{
    apply_penalties, unit, IntegrityConfig, IntegritySample, PenaltyInputs, SubScores,
};
use crate::models::interview::InterviewId;

/// Smallest elapsed time credited to a sample, for duplicate or reordered deliveries.
const MIN_DT_SECS: f64 = 0.001;

// ────────────────────────────────────────────────────────────────────────────
// State and responses
// ────────────────────────────────────────────────────────────────────────────

/// Accumulated behavioral state for a single interview session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityState {
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Time-weighted sample count, in seconds.
    pub sample_count: f64,

    pub sum_face: f64,
    pub sum_gaze: f64,
    pub sum_speak: f64,
    pub sum_blink: f64,

    pub ewma_face: f64,
    pub ewma_gaze: f64,
    pub ewma_speak: f64,
    pub ewma_blink: f64,
    #[serde(skip)]
    ewma_seeded: bool,

    /// +inf / -inf until the first sample; serialized as null in that case.
    pub min_instant_score: f64,
    pub max_instant_score: f64,

    pub multiple_face_seconds: f64,
    pub absent_seconds: f64,
    pub low_eye_contact_seconds: f64,

    pub violated_multiple_faces: bool,
    pub violated_absent: bool,
    pub violated_low_eye_contact: bool,
}

impl IntegrityState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            last_updated_at: now,
            sample_count: 0.0,
            sum_face: 0.0,
            sum_gaze: 0.0,
            sum_speak: 0.0,
            sum_blink: 0.0,
            ewma_face: 0.0,
            ewma_gaze: 0.0,
            ewma_speak: 0.0,
            ewma_blink: 0.0,
            ewma_seeded: false,
            min_instant_score: f64::INFINITY,
            max_instant_score: f64::NEG_INFINITY,
            multiple_face_seconds: 0.0,
            absent_seconds: 0.0,
            low_eye_contact_seconds: 0.0,
            violated_multiple_faces: false,
            violated_absent: false,
            violated_low_eye_contact: false,
        }
    }

    /// Folds one sample into the state and returns its instantaneous score.
    fn record(
        &mut self,
        sample: &IntegritySample,
        now: DateTime<Utc>,
        config: &IntegrityConfig,
    ) -> f64 {
        let elapsed_ms = (now - self.last_updated_at).num_milliseconds() as f64;
        let dt = (elapsed_ms / 1000.0).max(MIN_DT_SECS);

        let scores = SubScores::from_sample(sample, config);
        let instant = scores.combined(&config.weights);

        self.sample_count += dt;
        self.sum_face += scores.face * dt;
        self.sum_gaze += scores.gaze * dt;
        self.sum_speak += scores.speak * dt;
        self.sum_blink += scores.blink * dt;

        if self.ewma_seeded {
            let a = config.ewma_alpha;
            self.ewma_face = a * scores.face + (1.0 - a) * self.ewma_face;
            self.ewma_gaze = a * scores.gaze + (1.0 - a) * self.ewma_gaze;
            self.ewma_speak = a * scores.speak + (1.0 - a) * self.ewma_speak;
            self.ewma_blink = a * scores.blink + (1.0 - a) * self.ewma_blink;
        } else {
            self.ewma_face = scores.face;
            self.ewma_gaze = scores.gaze;
            self.ewma_speak = scores.speak;
            self.ewma_blink = scores.blink;
            self.ewma_seeded = true;
        }

        self.min_instant_score = self.min_instant_score.min(instant);
        self.max_instant_score = self.max_instant_score.max(instant);

        if sample.face_count > 1 {
            self.multiple_face_seconds += dt;
        }
        if sample.face_count == 0 {
            self.absent_seconds += dt;
        }
        if scores.gaze < config.low_gaze_threshold {
            self.low_eye_contact_seconds += dt;
        }

        // Sticky: once set, a flag stays set for the rest of the session.
        if self.multiple_face_seconds >= config.multiple_face_violation_secs {
            self.violated_multiple_faces = true;
        }
        if self.absent_seconds >= config.absent_violation_secs {
            self.violated_absent = true;
        }
        if self.low_eye_contact_seconds >= config.low_gaze_violation_secs {
            self.violated_low_eye_contact = true;
        }

        // Reordered deliveries never move the clock backwards.
        self.last_updated_at = self.last_updated_at.max(now);

        instant
    }

    /// Time-weighted average of each signal over the session so far.
    fn averages(&self) -> SubScores {
        let n = self.sample_count.max(1e-9);
        SubScores {
            face: self.sum_face / n,
            gaze: self.sum_gaze / n,
            speak: self.sum_speak / n,
            blink: self.sum_blink / n,
        }
    }

    fn ewmas(&self) -> SubScores {
        SubScores {
            face: self.ewma_face,
            gaze: self.ewma_gaze,
            speak: self.ewma_speak,
            blink: self.ewma_blink,
        }
    }

    /// Penalty-adjusted aggregate. The absence override is re-evaluated from
    /// `absent_seconds` on every call, independently of the sticky flag.
    fn aggregate_score(&self, config: &IntegrityConfig) -> f64 {
        let raw = self.averages().combined(&config.weights);
        let inputs = PenaltyInputs {
            absent_seconds: self.absent_seconds,
            multiple_face_seconds: self.multiple_face_seconds,
            low_eye_contact_violated: self.violated_low_eye_contact,
        };
        apply_penalties(raw, &inputs, config)
    }

    fn smoothed_score(&self, config: &IntegrityConfig) -> f64 {
        self.ewmas().combined(&config.weights)
    }

    fn violations(&self) -> Violations {
        Violations {
            multiple_faces: self.violated_multiple_faces,
            absent: self.violated_absent,
            low_eye_contact: self.violated_low_eye_contact,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violations {
    pub multiple_faces: bool,
    pub absent: bool,
    pub low_eye_contact: bool,
}

/// Returned on every sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityUpdateResponse {
    pub interview_id: InterviewId,
    pub instant_score: f64,
    /// Time-averaged score with violation penalties applied.
    pub aggregate_score: f64,
    /// EWMA-based combined score; never penalized.
    pub smoothed_score: f64,
    pub sample_count: u64,
    pub violations: Violations,
}

/// Returned once at session end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedIntegrity {
    pub final_score: f64,
    /// Final state snapshot; `None` when no sample was ever recorded.
    pub details: Option<IntegrityState>,
}

// ────────────────────────────────────────────────────────────────────────────
// Tracker
// ────────────────────────────────────────────────────────────────────────────

pub struct IntegrityTracker {
    config: IntegrityConfig,
    states: Mutex<HashMap<InterviewId, IntegrityState>>,
}

impl IntegrityTracker {
    pub fn new(config: IntegrityConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Records a sample stamped with the current wall-clock time.
    pub fn update(&self, interview_id: &InterviewId, sample: IntegritySample) -> IntegrityUpdateResponse {
        self.update_at(interview_id, sample, Utc::now())
    }

    /// Records a sample observed at `now`. A state is created lazily for
    /// unseen ids, including ids that were already finalized.
    pub fn update_at(
        &self,
        interview_id: &InterviewId,
        sample: IntegritySample,
        now: DateTime<Utc>,
    ) -> IntegrityUpdateResponse {
        let mut states = self.states.lock();
        let state = states.entry(interview_id.clone()).or_insert_with(|| {
            debug!("Starting integrity tracking for interview {interview_id}");
            IntegrityState::new(now)
        });

        let before = state.violations();
        let instant = state.record(&sample, now, &self.config);
        let violations = state.violations();
        log_new_violations(interview_id, before, violations);

        IntegrityUpdateResponse {
            interview_id: interview_id.clone(),
            instant_score: unit(instant),
            aggregate_score: state.aggregate_score(&self.config),
            smoothed_score: state.smoothed_score(&self.config),
            sample_count: state.sample_count.round() as u64,
            violations,
        }
    }

    /// Computes the session's final score and discards its state.
    pub fn finalize(&self, interview_id: &InterviewId) -> FinalizedIntegrity {
        let Some(state) = self.states.lock().remove(interview_id) else {
            info!(
                "No integrity samples for interview {interview_id}; using default score {}",
                self.config.no_data_score
            );
            return FinalizedIntegrity {
                final_score: unit(self.config.no_data_score),
                details: None,
            };
        };

        let final_score = state.aggregate_score(&self.config);
        info!(
            "Finalized integrity for interview {interview_id}: score={final_score:.3} \
             over {:.1}s (absent={:.1}s, multiple_faces={:.1}s, low_eye_contact={:.1}s)",
            state.sample_count,
            state.absent_seconds,
            state.multiple_face_seconds,
            state.low_eye_contact_seconds
        );

        FinalizedIntegrity {
            final_score,
            details: Some(state),
        }
    }

    /// The score `finalize` would return right now, leaving the state in place.
    pub fn current_score(&self, interview_id: &InterviewId) -> f64 {
        match self.states.lock().get(interview_id) {
            Some(state) => state.aggregate_score(&self.config),
            None => unit(self.config.no_data_score),
        }
    }

    /// Number of interviews currently being tracked.
    pub fn active_sessions(&self) -> usize {
        self.states.lock().len()
    }
}

fn log_new_violations(interview_id: &InterviewId, before: Violations, after: Violations) {
    if after.multiple_faces && !before.multiple_faces {
        warn!("Interview {interview_id}: multiple faces sustained past threshold");
    }
    if after.absent && !before.absent {
        warn!("Interview {interview_id}: candidate absent past threshold");
    }
    if after.low_eye_contact && !before.low_eye_contact {
        warn!("Interview {interview_id}: sustained low eye contact");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
