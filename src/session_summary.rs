//! End-of-session metrics, insights and recommendations.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::{evaluate_rules, InsightRule};
use crate::errors::{DopamindError, DopamindResult};
use crate::reward::RewardType;

const TREND_BAND: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReward {
    #[serde(rename = "type", default)]
    pub reward_type: Option<String>,
    #[serde(default)]
    pub intensity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub rewards: Vec<SessionReward>,
    #[serde(default)]
    pub focus_mode: bool,
}

impl SessionData {
    pub fn validate(&self) -> DopamindResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(DopamindError::validation(
                "session_data.duration",
                "session_data.duration must be a non-negative number of seconds",
            ));
        }
        if self.rewards.iter().any(|r| !r.intensity.is_finite()) {
            return Err(DopamindError::validation(
                "session_data.rewards",
                "reward intensities must be finite numbers",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DopamineTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl DopamineTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DopamineTrend::Increasing => "increasing",
            DopamineTrend::Decreasing => "decreasing",
            DopamineTrend::Stable => "stable",
        }
    }

    /// Compare the second half of the session against the first.
    pub fn from_rewards(rewards: &[SessionReward]) -> Self {
        if rewards.len() < 2 {
            return DopamineTrend::Stable;
        }
        let (first, second) = rewards.split_at(rewards.len() / 2);
        let first_avg = mean_intensity(first);
        let second_avg = mean_intensity(second);
        if second_avg > first_avg * (1.0 + TREND_BAND) {
            DopamineTrend::Increasing
        } else if second_avg < first_avg * (1.0 - TREND_BAND) {
            DopamineTrend::Decreasing
        } else {
            DopamineTrend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub total_rewards: usize,
    pub average_intensity: f64,
    pub session_duration: f64,
    pub focus_mode: bool,
    pub dopamine_trend: DopamineTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_metrics: SessionMetrics,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

fn mean_intensity(rewards: &[SessionReward]) -> f64 {
    if rewards.is_empty() {
        return 0.0;
    }
    rewards.iter().map(|r| r.intensity).sum::<f64>() / rewards.len() as f64
}

/// How the session's rewards were spread across reward types.
struct RewardMix {
    total: usize,
    most_used: Option<(String, usize)>,
    alternative: Option<String>,
    first_unused: Option<RewardType>,
    duration: f64,
    average_intensity: f64,
}

impl RewardMix {
    fn new(data: &SessionData) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for reward in &data.rewards {
            let name = reward.reward_type.clone().unwrap_or_default();
            *counts.entry(name).or_insert(0) += 1;
        }

        // Ties resolve to the alphabetically first type.
        let most_used = counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, count)| (name.clone(), *count));

        let first_unused = RewardType::ALL
            .iter()
            .copied()
            .find(|rt| !counts.contains_key(rt.as_str()));

        let alternative = first_unused.map(|rt| rt.as_str().to_string()).or_else(|| {
            let most = most_used.as_ref().map(|(name, _)| name.as_str());
            counts
                .iter()
                .filter(|(name, _)| Some(name.as_str()) != most)
                .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
                .map(|(name, _)| name.clone())
        });

        Self {
            total: data.rewards.len(),
            most_used,
            alternative,
            first_unused,
            duration: data.duration,
            average_intensity: mean_intensity(&data.rewards),
        }
    }

    fn dominated(&self) -> bool {
        self.alternative.is_some()
            && self
                .most_used
                .as_ref()
                .is_some_and(|(_, count)| *count as f64 > self.total as f64 * 0.6)
    }
}

lazy_static! {
    static ref SESSION_INSIGHTS: Vec<InsightRule<SessionMetrics>> = vec![
        InsightRule::new(
            |m: &SessionMetrics| m.average_intensity > 0.7,
            |_: &SessionMetrics| "High engagement session - great dopamine response!".into(),
        ),
        InsightRule::new(
            |m: &SessionMetrics| m.average_intensity < 0.4,
            |_: &SessionMetrics| "Calm session - good for mindfulness practice".into(),
        ),
        InsightRule::new(
            |m: &SessionMetrics| m.total_rewards > 10,
            |_: &SessionMetrics| "Very active session - lots of interactions".into(),
        ),
        InsightRule::new(
            |m: &SessionMetrics| m.total_rewards < 3,
            |_: &SessionMetrics| "Minimal session - consider longer engagement".into(),
        ),
        InsightRule::new(
            |m: &SessionMetrics| m.session_duration > 300.0,
            |_: &SessionMetrics| "Long session - good for building habits".into(),
        ),
        InsightRule::new(
            |m: &SessionMetrics| m.dopamine_trend == DopamineTrend::Increasing,
            |_: &SessionMetrics| "Dopamine levels increased during session - great momentum!".into(),
        ),
        InsightRule::new(
            |m: &SessionMetrics| m.dopamine_trend == DopamineTrend::Decreasing,
            |_: &SessionMetrics| "Dopamine levels decreased - consider taking breaks".into(),
        ),
    ];

    static ref SESSION_RECOMMENDATIONS: Vec<InsightRule<RewardMix>> = vec![
        InsightRule::new(
            |mix: &RewardMix| mix.dominated(),
            |mix: &RewardMix| {
                let most = mix.most_used.as_ref().map(|(name, _)| name.as_str()).unwrap_or_default();
                let alt = mix.alternative.as_deref().unwrap_or_default();
                format!("You used {most} rewards frequently - try exploring {alt} for variety")
            },
        ),
        InsightRule::new(
            |mix: &RewardMix| mix.first_unused.is_some(),
            |mix: &RewardMix| {
                let unused = mix.first_unused.map(|rt| rt.as_str()).unwrap_or_default();
                format!("Consider trying {unused} rewards for different emotional responses")
            },
        ),
        InsightRule::new(
            |mix: &RewardMix| mix.duration < 60.0,
            |_: &RewardMix| "Try longer sessions for better habit formation".into(),
        ),
        InsightRule::new(
            |mix: &RewardMix| mix.duration > 1800.0,
            |_: &RewardMix| "Consider shorter, more focused sessions".into(),
        ),
        InsightRule::new(
            |mix: &RewardMix| mix.average_intensity > 0.8,
            |_: &RewardMix| "High intensity session - great for building excitement!".into(),
        ),
        InsightRule::new(
            |mix: &RewardMix| mix.average_intensity < 0.3,
            |_: &RewardMix| "Low intensity session - good for calm, mindful practice".into(),
        ),
    ];
}

pub fn session_metrics(data: &SessionData) -> SessionMetrics {
    SessionMetrics {
        total_rewards: data.rewards.len(),
        average_intensity: mean_intensity(&data.rewards),
        session_duration: data.duration,
        focus_mode: data.focus_mode,
        dopamine_trend: DopamineTrend::from_rewards(&data.rewards),
    }
}

pub fn recommendations(data: &SessionData) -> Vec<String> {
    if data.rewards.is_empty() {
        return vec!["Try interacting more to get better insights".to_string()];
    }
    evaluate_rules(SESSION_RECOMMENDATIONS.as_slice(), &RewardMix::new(data))
}

pub fn summarize_session(data: &SessionData) -> DopamindResult<SessionSummary> {
    data.validate()?;
    let session_metrics = session_metrics(data);
    let insights = evaluate_rules(SESSION_INSIGHTS.as_slice(), &session_metrics);
    Ok(SessionSummary {
        insights,
        recommendations: recommendations(data),
        session_metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(t: &str, intensity: f64) -> SessionReward {
        SessionReward {
            reward_type: Some(t.to_string()),
            intensity,
        }
    }

    #[test]
    fn empty_session_gets_default_recommendation() {
        let summary = summarize_session(&SessionData::default()).unwrap();
        assert_eq!(summary.session_metrics.total_rewards, 0);
        assert_eq!(summary.session_metrics.average_intensity, 0.0);
        assert_eq!(summary.session_metrics.dopamine_trend, DopamineTrend::Stable);
        assert_eq!(
            summary.recommendations,
            vec!["Try interacting more to get better insights".to_string()]
        );
        assert!(summary
            .insights
            .contains(&"Minimal session - consider longer engagement".to_string()));
    }

    #[test]
    fn trend_detects_rising_and_falling_sessions() {
        let rising = vec![reward("like", 0.2), reward("like", 0.3), reward("like", 0.8), reward("like", 0.9)];
        assert_eq!(DopamineTrend::from_rewards(&rising), DopamineTrend::Increasing);

        let falling: Vec<_> = rising.iter().rev().cloned().collect();
        assert_eq!(DopamineTrend::from_rewards(&falling), DopamineTrend::Decreasing);

        let flat = vec![reward("like", 0.5), reward("share", 0.52)];
        assert_eq!(DopamineTrend::from_rewards(&flat), DopamineTrend::Stable);
    }

    #[test]
    fn dominated_session_suggests_an_unused_type() {
        let data = SessionData {
            duration: 120.0,
            rewards: vec![reward("like", 0.5), reward("like", 0.5), reward("like", 0.5), reward("share", 0.5)],
            focus_mode: true,
        };
        let recs = recommendations(&data);
        assert_eq!(
            recs,
            vec![
                "You used like rewards frequently - try exploring comment for variety".to_string(),
                "Consider trying comment rewards for different emotional responses".to_string(),
            ]
        );
    }

    #[test]
    fn long_intense_session_insights() {
        let rewards: Vec<_> = (0..12).map(|_| reward("milestone", 0.9)).collect();
        let data = SessionData {
            duration: 2000.0,
            rewards,
            focus_mode: false,
        };
        let summary = summarize_session(&data).unwrap();
        assert_eq!(
            summary.insights,
            vec![
                "High engagement session - great dopamine response!".to_string(),
                "Very active session - lots of interactions".to_string(),
                "Long session - good for building habits".to_string(),
            ]
        );
        assert!(summary
            .recommendations
            .contains(&"Consider shorter, more focused sessions".to_string()));
        assert!(summary
            .recommendations
            .contains(&"High intensity session - great for building excitement!".to_string()));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let data = SessionData {
            duration: -1.0,
            ..Default::default()
        };
        assert!(summarize_session(&data).is_err());
    }
}
