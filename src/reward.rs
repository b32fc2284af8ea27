//! Reward vocabulary: the closed set of reward types, the emotion labels they
//! map to, and the user context that accompanies every reward event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::errors::{DopamindError, DopamindResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    Like,
    Comment,
    Share,
    Achievement,
    Connection,
    Discovery,
    Streak,
    Milestone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionType {
    Happy,
    Excited,
    Calm,
    Focused,
    Anxious,
    Frustrated,
    Content,
    Energetic,
    Tired,
    Sad,
}

/// Fixed scoring constants for one reward type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardProfile {
    pub emotion: EmotionType,
    pub intensity_modifier: f64,
    pub peak: f64,
    pub duration_secs: f64,
}

/// Intensity every reward starts from before the per-type modifier.
pub const BASE_INTENSITY: f64 = 0.5;

impl RewardType {
    pub const ALL: [RewardType; 8] = [
        RewardType::Like,
        RewardType::Comment,
        RewardType::Share,
        RewardType::Achievement,
        RewardType::Connection,
        RewardType::Discovery,
        RewardType::Streak,
        RewardType::Milestone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Like => "like",
            RewardType::Comment => "comment",
            RewardType::Share => "share",
            RewardType::Achievement => "achievement",
            RewardType::Connection => "connection",
            RewardType::Discovery => "discovery",
            RewardType::Streak => "streak",
            RewardType::Milestone => "milestone",
        }
    }

    pub fn profile(&self) -> RewardProfile {
        let (emotion, intensity_modifier, peak, duration_secs) = match self {
            RewardType::Like => (EmotionType::Happy, 0.3, 0.6, 2.0),
            RewardType::Comment => (EmotionType::Excited, 0.5, 0.7, 3.0),
            RewardType::Share => (EmotionType::Energetic, 0.7, 0.8, 4.0),
            RewardType::Achievement => (EmotionType::Excited, 0.8, 0.9, 5.0),
            RewardType::Connection => (EmotionType::Happy, 0.6, 0.7, 3.5),
            RewardType::Discovery => (EmotionType::Focused, 0.6, 0.8, 4.5),
            RewardType::Streak => (EmotionType::Energetic, 0.7, 0.8, 5.0),
            RewardType::Milestone => (EmotionType::Excited, 0.9, 0.95, 6.0),
        };
        RewardProfile {
            emotion,
            intensity_modifier,
            peak,
            duration_secs,
        }
    }

    /// Intensity before any context adjustment.
    pub fn base_intensity(&self) -> f64 {
        (BASE_INTENSITY + self.profile().intensity_modifier).clamp(0.0, 1.0)
    }

    /// Comma separated list used in validation messages.
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(RewardType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for RewardType {
    type Err = DopamindError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|rt| rt.as_str() == input)
            .ok_or_else(|| {
                DopamindError::validation(
                    "reward_type",
                    format!(
                        "Invalid reward type. Must be one of: {}",
                        Self::valid_list()
                    ),
                )
            })
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EmotionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionType::Happy => "happy",
            EmotionType::Excited => "excited",
            EmotionType::Calm => "calm",
            EmotionType::Focused => "focused",
            EmotionType::Anxious => "anxious",
            EmotionType::Frustrated => "frustrated",
            EmotionType::Content => "content",
            EmotionType::Energetic => "energetic",
            EmotionType::Tired => "tired",
            EmotionType::Sad => "sad",
        }
    }
}

impl FromStr for EmotionType {
    type Err = DopamindError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let emotion = match input {
            "happy" => EmotionType::Happy,
            "excited" => EmotionType::Excited,
            "calm" => EmotionType::Calm,
            "focused" => EmotionType::Focused,
            "anxious" => EmotionType::Anxious,
            "frustrated" => EmotionType::Frustrated,
            "content" => EmotionType::Content,
            "energetic" => EmotionType::Energetic,
            "tired" => EmotionType::Tired,
            "sad" => EmotionType::Sad,
            other => {
                return Err(DopamindError::validation(
                    "emotion",
                    format!("unknown emotion '{other}'"),
                ))
            }
        };
        Ok(emotion)
    }
}

impl fmt::Display for EmotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User state sent with a reward. Recognised keys are parsed and validated;
/// the full object is kept so it can be echoed back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct RewardContext {
    pub fatigue_level: Option<f64>,
    pub stress_level: Option<f64>,
    pub mood: Option<String>,
    /// Hour of day, 0-23.
    pub time_of_day: Option<u32>,
    raw: Map<String, Value>,
}

impl RewardContext {
    pub fn from_map(raw: Map<String, Value>) -> DopamindResult<Self> {
        let fatigue_level = number_field(&raw, "fatigue_level")?;
        let stress_level = number_field(&raw, "stress_level")?;
        let mood = match raw.get("mood") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(DopamindError::validation(
                    "context.mood",
                    "context.mood must be a string",
                ))
            }
        };
        let time_of_day = match raw.get("time_of_day") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_hour(value)?),
        };

        Ok(Self {
            fatigue_level,
            stress_level,
            mood,
            time_of_day,
            raw,
        })
    }

    /// Number of recognised context fields that were supplied.
    pub fn signal_count(&self) -> usize {
        [
            self.fatigue_level.is_some(),
            self.stress_level.is_some(),
            self.mood.is_some(),
            self.time_of_day.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    pub fn is_positive_mood(&self) -> bool {
        self.mood.as_deref() == Some("positive")
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl TryFrom<Map<String, Value>> for RewardContext {
    type Error = DopamindError;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_map(raw)
    }
}

impl From<RewardContext> for Map<String, Value> {
    fn from(ctx: RewardContext) -> Self {
        ctx.raw
    }
}

fn number_field(raw: &Map<String, Value>, key: &str) -> DopamindResult<Option<f64>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| {
                DopamindError::validation(
                    format!("context.{key}"),
                    format!("context.{key} must be a number"),
                )
            }),
    }
}

fn parse_hour(value: &Value) -> DopamindResult<u32> {
    let invalid = || {
        DopamindError::validation(
            "context.time_of_day",
            "context.time_of_day must be an hour (0-23) or one of: morning, afternoon, evening, night",
        )
    };
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|h| (0.0..24.0).contains(h))
            .map(|h| h.floor() as u32)
            .ok_or_else(invalid),
        Value::String(s) => match s.as_str() {
            "morning" => Ok(9),
            "afternoon" => Ok(15),
            "evening" => Ok(19),
            "night" => Ok(23),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|h| *h < 24)
                .ok_or_else(invalid),
        },
        _ => Err(invalid()),
    }
}

/// One prior reward in the caller's current session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistoryEntry {
    #[serde(rename = "type", default)]
    pub reward_type: Option<String>,
    #[serde(default)]
    pub intensity: Option<f64>,
}

/// A validated reward event, alive for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardEvent {
    pub user_id: String,
    pub reward_type: RewardType,
    pub context: RewardContext,
    pub session_history: Vec<SessionHistoryEntry>,
    pub timestamp: DateTime<Utc>,
}

impl RewardEvent {
    pub fn new(user_id: impl Into<String>, reward_type: RewardType, context: RewardContext) -> Self {
        Self {
            user_id: user_id.into(),
            reward_type,
            context,
            session_history: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_history(mut self, history: Vec<SessionHistoryEntry>) -> Self {
        self.session_history = history;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> DopamindResult<RewardContext> {
        match value {
            Value::Object(map) => RewardContext::from_map(map),
            _ => panic!("test context must be an object"),
        }
    }

    #[test]
    fn unknown_reward_type_lists_valid_types() {
        let err = "flying".parse::<RewardType>().unwrap_err();
        let msg = err.to_string();
        for rt in RewardType::ALL {
            assert!(msg.contains(rt.as_str()), "missing {rt} in {msg}");
        }
        match err {
            DopamindError::Validation { field, message } => {
                assert_eq!(field, "reward_type");
                assert_eq!(
                    message,
                    "Invalid reward type. Must be one of: like, comment, share, achievement, \
                     connection, discovery, streak, milestone"
                );
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn reward_type_round_trips_through_serde_names() {
        let parsed: RewardType = serde_json::from_value(json!("milestone")).unwrap();
        assert_eq!(parsed, RewardType::Milestone);
        assert_eq!(RewardType::Milestone.to_string(), "milestone");
    }

    #[test]
    fn base_intensity_saturates_at_one() {
        assert!((RewardType::Like.base_intensity() - 0.8).abs() < 1e-9);
        assert_eq!(RewardType::Milestone.base_intensity(), 1.0);
    }

    #[test]
    fn context_parses_recognised_fields() {
        let c = ctx(json!({
            "fatigue_level": 0.9,
            "mood": "positive",
            "time_of_day": "night",
            "device": "phone"
        }))
        .unwrap();
        assert_eq!(c.fatigue_level, Some(0.9));
        assert!(c.is_positive_mood());
        assert_eq!(c.time_of_day, Some(23));
        assert_eq!(c.signal_count(), 3);
        assert_eq!(c.raw().get("device"), Some(&json!("phone")));
    }

    #[test]
    fn context_rejects_wrong_types() {
        assert!(ctx(json!({"fatigue_level": "high"})).is_err());
        assert!(ctx(json!({"mood": 3})).is_err());
        assert!(ctx(json!({"time_of_day": 25})).is_err());
        assert!(ctx(json!({"time_of_day": "noonish"})).is_err());
    }

    #[test]
    fn context_serializes_as_received() {
        let received = json!({"stress_level": 0.2, "extra": [1, 2]});
        let c: RewardContext = serde_json::from_value(received.clone()).unwrap();
        assert_eq!(serde_json::to_value(&c).unwrap(), received);
    }
}
