//! Emotion scoring: reward type + context -> emotion label, intensity and
//! confidence.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::DopamindResult;
use crate::reward::{EmotionType, RewardContext, RewardType, SessionHistoryEntry};

const FATIGUE_THRESHOLD: f64 = 0.7;
const STRESS_THRESHOLD: f64 = 0.6;
const PEAK_HOURS: [u32; 6] = [9, 10, 11, 14, 15, 16];
const LATE_HOURS: [u32; 8] = [22, 23, 0, 1, 2, 3, 4, 5];

/// Only this many trailing history entries are checked for repeats.
const HABITUATION_WINDOW: usize = 5;
const HABITUATION_REPEATS: usize = 2;

const CONFIDENCE_BASE: f64 = 0.5;
const CONFIDENCE_PER_SIGNAL: f64 = 0.1;
const CONFIDENCE_CAP: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    #[serde(rename = "type")]
    pub emotion: EmotionType,
    pub intensity: f64,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Scorer output: the emotion plus the intensity before personalisation,
/// which is what the adaptive weights learn from.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionScore {
    pub result: EmotionResult,
    pub raw_intensity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EmotionScorer {
    jitter: f64,
}

impl EmotionScorer {
    pub fn new(jitter: f64) -> Self {
        Self {
            jitter: jitter.max(0.0),
        }
    }

    pub fn score(
        &self,
        reward_type: RewardType,
        context: &RewardContext,
        session_history: &[SessionHistoryEntry],
        weight: f64,
    ) -> EmotionScore {
        let profile = reward_type.profile();

        let mut raw = reward_type.base_intensity();
        raw *= state_multiplier(context);
        raw *= time_multiplier(context);
        if is_habituated(reward_type, session_history) {
            raw *= 0.9;
        }
        let raw_intensity = raw.clamp(0.0, 1.0);

        let mut intensity = raw_intensity * weight;
        if self.jitter > 0.0 {
            intensity += rand::rng().random_range(-self.jitter..=self.jitter);
        }

        EmotionScore {
            result: EmotionResult {
                emotion: profile.emotion,
                intensity: intensity.clamp(0.0, 1.0),
                confidence: confidence(context, session_history),
                timestamp: Utc::now(),
            },
            raw_intensity,
        }
    }

    /// Score a reward named on the wire; fails for unknown reward types.
    pub fn score_named(
        &self,
        reward_type: &str,
        context: &RewardContext,
        session_history: &[SessionHistoryEntry],
        weight: f64,
    ) -> DopamindResult<EmotionScore> {
        let reward_type = reward_type.parse::<RewardType>()?;
        Ok(self.score(reward_type, context, session_history, weight))
    }
}

/// Unpersonalised, noise-free scoring.
pub fn score_emotion(reward_type: RewardType, context: &RewardContext) -> EmotionResult {
    EmotionScorer::default()
        .score(reward_type, context, &[], 1.0)
        .result
}

/// Fatigue, stress and mood adjustments shared with the dopamine baseline.
pub(crate) fn state_multiplier(context: &RewardContext) -> f64 {
    let mut m = 1.0;
    if context.fatigue_level.is_some_and(|f| f > FATIGUE_THRESHOLD) {
        m *= 0.8;
    }
    if context.stress_level.is_some_and(|s| s > STRESS_THRESHOLD) {
        m *= 0.9;
    }
    if context.is_positive_mood() {
        m *= 1.1;
    }
    m
}

fn time_multiplier(context: &RewardContext) -> f64 {
    match context.time_of_day {
        Some(hour) if PEAK_HOURS.contains(&hour) => 1.1,
        Some(hour) if LATE_HOURS.contains(&hour) => 0.9,
        _ => 1.0,
    }
}

fn is_habituated(reward_type: RewardType, history: &[SessionHistoryEntry]) -> bool {
    let start = history.len().saturating_sub(HABITUATION_WINDOW);
    let repeats = history[start..]
        .iter()
        .filter(|entry| entry.reward_type.as_deref() == Some(reward_type.as_str()))
        .count();
    repeats > HABITUATION_REPEATS
}

fn confidence(context: &RewardContext, history: &[SessionHistoryEntry]) -> f64 {
    let signals = (context.signal_count() + history.len()) as f64;
    (CONFIDENCE_BASE + CONFIDENCE_PER_SIGNAL * signals).min(CONFIDENCE_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn ctx(value: Value) -> RewardContext {
        serde_json::from_value(value).expect("valid context")
    }

    fn history(types: &[&str]) -> Vec<SessionHistoryEntry> {
        types
            .iter()
            .map(|t| SessionHistoryEntry {
                reward_type: Some(t.to_string()),
                intensity: None,
            })
            .collect()
    }

    #[test]
    fn like_with_empty_context_returns_table_values() {
        let result = score_emotion(RewardType::Like, &RewardContext::default());
        assert_eq!(result.emotion, EmotionType::Happy);
        assert!((result.intensity - RewardType::Like.base_intensity()).abs() < 1e-12);
        assert!((result.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn scores_stay_in_unit_range_for_every_reward() {
        let contexts = [
            json!({}),
            json!({"fatigue_level": 0.95, "stress_level": 0.9, "time_of_day": 2}),
            json!({"mood": "positive", "time_of_day": 10, "fatigue_level": 0.0, "stress_level": 0.0}),
        ];
        let scorer = EmotionScorer::new(0.1);
        for rt in RewardType::ALL {
            for c in &contexts {
                for weight in [0.0, 0.5, 1.0, 3.0] {
                    let r = scorer.score(rt, &ctx(c.clone()), &history(&["like"; 12]), weight).result;
                    assert!((0.0..=1.0).contains(&r.intensity), "{rt}: {}", r.intensity);
                    assert!((0.0..=1.0).contains(&r.confidence), "{rt}: {}", r.confidence);
                }
            }
        }
    }

    #[test]
    fn fatigue_reduces_intensity() {
        let rested = score_emotion(RewardType::Like, &ctx(json!({"fatigue_level": 0.1})));
        let tired = score_emotion(RewardType::Like, &ctx(json!({"fatigue_level": 0.9})));
        assert!(tired.intensity < rested.intensity);
        assert!((tired.intensity - 0.64).abs() < 1e-9);
    }

    #[test]
    fn positive_mood_boosts_intensity() {
        let r = score_emotion(RewardType::Like, &ctx(json!({"mood": "positive"})));
        assert!((r.intensity - 0.88).abs() < 1e-9);
    }

    #[test]
    fn late_night_dampens_intensity() {
        let r = score_emotion(RewardType::Like, &ctx(json!({"time_of_day": "night"})));
        assert!((r.intensity - 0.72).abs() < 1e-9);
    }

    #[test]
    fn peak_hours_boost_intensity() {
        for time in [json!(10), json!("afternoon"), json!("morning")] {
            let r = score_emotion(RewardType::Like, &ctx(json!({"time_of_day": time})));
            assert!((r.intensity - 0.88).abs() < 1e-9, "{time}: {}", r.intensity);
        }
        let midday = score_emotion(RewardType::Like, &ctx(json!({"time_of_day": 12})));
        assert!((midday.intensity - 0.8).abs() < 1e-9);
    }

    #[test]
    fn stress_above_threshold_dampens_intensity() {
        let stressed = score_emotion(RewardType::Like, &ctx(json!({"stress_level": 0.7})));
        assert!((stressed.intensity - 0.72).abs() < 1e-9);

        // Both thresholds are strict.
        let at_stress = score_emotion(RewardType::Like, &ctx(json!({"stress_level": 0.6})));
        assert!((at_stress.intensity - 0.8).abs() < 1e-9);
        let at_fatigue = score_emotion(RewardType::Like, &ctx(json!({"fatigue_level": 0.7})));
        assert!((at_fatigue.intensity - 0.8).abs() < 1e-9);
    }

    #[test]
    fn repeated_rewards_in_recent_history_habituate() {
        let scorer = EmotionScorer::default();
        let empty = RewardContext::default();
        let fresh = scorer.score(RewardType::Like, &empty, &history(&["like", "like"]), 1.0);
        let repeated = scorer.score(RewardType::Like, &empty, &history(&["like", "like", "like"]), 1.0);
        assert!((fresh.raw_intensity - 0.8).abs() < 1e-9);
        assert!((repeated.raw_intensity - 0.72).abs() < 1e-9);

        // Only the trailing window counts.
        let old = scorer.score(
            RewardType::Like,
            &empty,
            &history(&["like", "like", "like", "share", "share", "share", "share", "share"]),
            1.0,
        );
        assert!((old.raw_intensity - 0.8).abs() < 1e-9);
    }

    #[test]
    fn confidence_grows_with_context_and_caps() {
        let one = score_emotion(RewardType::Share, &ctx(json!({"mood": "neutral"})));
        assert!((one.confidence - 0.6).abs() < 1e-9);

        let scorer = EmotionScorer::default();
        let full = scorer.score(
            RewardType::Share,
            &ctx(json!({"mood": "neutral", "fatigue_level": 0.1, "stress_level": 0.1, "time_of_day": 12})),
            &history(&["comment", "share"]),
            1.0,
        );
        assert!((full.result.confidence - CONFIDENCE_CAP).abs() < 1e-9);
    }

    #[test]
    fn weight_scales_personalised_intensity_only() {
        let scorer = EmotionScorer::default();
        let score = scorer.score(RewardType::Like, &RewardContext::default(), &[], 0.5);
        assert!((score.result.intensity - 0.4).abs() < 1e-9);
        assert!((score.raw_intensity - 0.8).abs() < 1e-9);
    }

    #[test]
    fn named_scoring_rejects_unknown_types() {
        let scorer = EmotionScorer::default();
        assert!(scorer
            .score_named("flying", &RewardContext::default(), &[], 1.0)
            .is_err());
    }
}
