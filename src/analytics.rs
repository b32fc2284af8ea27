//! Analytics over persisted reward history: per-emotion counts, averages,
//! per-day breakdowns, and the canned insight text derived from them.

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{DopamindError, DopamindResult};
use crate::history_store::{HistoryQuery, HistoryStore, MoodEntry};

pub const MAX_TREND_DAYS: i64 = 365;

/// One insight rule: if `applies` holds for the subject, `message` is emitted.
pub struct InsightRule<T> {
    pub applies: fn(&T) -> bool,
    pub message: fn(&T) -> String,
}

impl<T> InsightRule<T> {
    pub fn new(applies: fn(&T) -> bool, message: fn(&T) -> String) -> Self {
        Self { applies, message }
    }
}

/// Evaluate rules in order, collecting every match.
pub fn evaluate_rules<T>(rules: &[InsightRule<T>], subject: &T) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(subject))
        .map(|rule| (rule.message)(subject))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPattern {
    pub intensity: f64,
    pub confidence: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub emotion_distribution: BTreeMap<String, usize>,
    pub average_intensity: f64,
    pub average_confidence: f64,
    pub average_dopamine_peak: f64,
    /// Keyed by `YYYY-MM-DD` (UTC).
    pub daily_patterns: BTreeMap<String, DailyPattern>,
    pub total_entries: usize,
    pub total_sessions: usize,
}

impl TrendSummary {
    pub fn from_entries(entries: &[MoodEntry], total_sessions: usize) -> Self {
        let mut summary = TrendSummary {
            total_entries: entries.len(),
            total_sessions,
            ..Default::default()
        };
        if entries.is_empty() {
            return summary;
        }

        let n = entries.len() as f64;
        summary.average_intensity = entries.iter().map(|e| e.intensity).sum::<f64>() / n;
        summary.average_confidence = entries.iter().map(|e| e.confidence).sum::<f64>() / n;

        let peaks: Vec<f64> = entries.iter().filter_map(|e| e.dopamine_peak).collect();
        if !peaks.is_empty() {
            summary.average_dopamine_peak = peaks.iter().sum::<f64>() / peaks.len() as f64;
        }

        for entry in entries {
            *summary
                .emotion_distribution
                .entry(entry.emotion.as_str().to_string())
                .or_insert(0) += 1;

            let day = summary
                .daily_patterns
                .entry(entry.recorded_at.format("%Y-%m-%d").to_string())
                .or_default();
            day.intensity += entry.intensity;
            day.confidence += entry.confidence;
            day.count += 1;
        }
        for day in summary.daily_patterns.values_mut() {
            let count = day.count as f64;
            day.intensity /= count;
            day.confidence /= count;
        }
        summary
    }

    pub fn distinct_emotions(&self) -> usize {
        self.emotion_distribution.len()
    }
}

lazy_static! {
    static ref TREND_RULES: Vec<InsightRule<TrendSummary>> = vec![
        InsightRule::new(
            |s: &TrendSummary| s.average_intensity > 0.7,
            |_: &TrendSummary| "You're experiencing high emotional intensity - great for engagement!".into(),
        ),
        InsightRule::new(
            |s: &TrendSummary| s.average_intensity < 0.4,
            |_: &TrendSummary| "Your emotional responses are quite calm - consider trying different reward types".into(),
        ),
        InsightRule::new(
            |s: &TrendSummary| s.distinct_emotions() < 3,
            |_: &TrendSummary| "Try exploring different types of interactions for more emotional variety".into(),
        ),
        InsightRule::new(
            |s: &TrendSummary| s.average_confidence > 0.8,
            |_: &TrendSummary| "The AI is very confident in predicting your emotional responses".into(),
        ),
        InsightRule::new(
            |s: &TrendSummary| s.average_confidence < 0.5,
            |_: &TrendSummary| "More data would help improve emotion prediction accuracy".into(),
        ),
    ];
}

/// Canned insights for a summary; nothing for an empty summary.
pub fn get_insights(summary: &TrendSummary) -> Vec<String> {
    if summary.total_entries == 0 {
        return Vec::new();
    }
    evaluate_rules(TREND_RULES.as_slice(), summary)
}

pub fn validate_days(days: i64) -> DopamindResult<i64> {
    if (1..=MAX_TREND_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(DopamindError::validation(
            "days",
            format!("days must be between 1 and {MAX_TREND_DAYS}, got {days}"),
        ))
    }
}

/// Trends for one user over the trailing `days` window ending at `now`.
pub fn get_trends(
    store: &dyn HistoryStore,
    user_id: &str,
    days: i64,
    now: DateTime<Utc>,
) -> DopamindResult<TrendSummary> {
    let days = validate_days(days)?;
    let query = HistoryQuery::for_user(user_id).since(now - Duration::days(days));
    let entries = store.moods(&query)?;
    let sessions = store.session_count(&query)?;
    Ok(TrendSummary::from_entries(&entries, sessions))
}

/// Trends across every user and all recorded history.
pub fn get_global_trends(store: &dyn HistoryStore) -> DopamindResult<TrendSummary> {
    let query = HistoryQuery::all();
    let entries = store.moods(&query)?;
    let sessions = store.session_count(&query)?;
    Ok(TrendSummary::from_entries(&entries, sessions))
}
