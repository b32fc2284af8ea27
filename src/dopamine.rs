//! Dopamine response curve derived from a scored emotion.

use serde::{Deserialize, Serialize};

use crate::emotion::{state_multiplier, EmotionResult};
use crate::reward::{RewardContext, RewardType, SessionHistoryEntry};

const BASELINE_DOPAMINE: f64 = 0.3;
const BASELINE_RANGE: (f64, f64) = (0.1, 0.5);
const PEAK_RANGE: (f64, f64) = (0.3, 1.0);
const DECAY_FLOOR: f64 = 0.05;
const DECAY_PER_INTENSITY: f64 = 0.1;
const HABITUATION_PER_ENTRY: f64 = 0.05;
const HABITUATION_FLOOR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DopamineResult {
    pub baseline: f64,
    pub peak: f64,
    /// Seconds.
    pub duration: f64,
    pub decay_rate: f64,
    pub emotional_impact: f64,
}

pub fn score_dopamine(
    emotion: &EmotionResult,
    reward_type: RewardType,
    context: &RewardContext,
    session_history: &[SessionHistoryEntry],
) -> DopamineResult {
    let profile = reward_type.profile();
    let intensity = emotion.intensity.clamp(0.0, 1.0);
    let habituation = habituation(session_history.len());

    let baseline =
        (BASELINE_DOPAMINE * state_multiplier(context)).clamp(BASELINE_RANGE.0, BASELINE_RANGE.1);
    let peak = (profile.peak * (0.5 + intensity * 0.5)).clamp(PEAK_RANGE.0, PEAK_RANGE.1);

    DopamineResult {
        baseline,
        peak,
        duration: profile.duration_secs * habituation,
        decay_rate: (DECAY_FLOOR + intensity * DECAY_PER_INTENSITY) / habituation,
        emotional_impact: (intensity * emotion.confidence).clamp(0.0, 1.0),
    }
}

/// Shrinks toward `HABITUATION_FLOOR` as the session accumulates rewards.
fn habituation(history_len: usize) -> f64 {
    (1.0 - HABITUATION_PER_ENTRY * history_len as f64).max(HABITUATION_FLOOR)
}
