//! Historical reward, mood and session rows read by the analytics aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::dopamine::DopamineResult;
use crate::emotion::EmotionResult;
use crate::errors::{DopamindResult, SafeReadLock, SafeWriteLock};
use crate::reward::{EmotionType, RewardType};

/// One scored reward as persisted to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub user_id: String,
    pub reward_type: RewardType,
    pub emotion: EmotionType,
    pub intensity: f64,
    pub confidence: f64,
    pub dopamine_peak: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

/// Output of the scoring pipeline handed to the store.
#[derive(Debug, Clone)]
pub struct RewardRecord<'a> {
    pub user_id: &'a str,
    pub reward_type: RewardType,
    pub emotion: &'a EmotionResult,
    pub dopamine: &'a DopamineResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub duration: f64,
    pub total_rewards: usize,
    pub average_intensity: f64,
    pub focus_mode: bool,
    pub dopamine_trend: String,
    pub recorded_at: DateTime<Utc>,
}

/// Row filter shared by every history read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    pub user_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            since: None,
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    fn matches(&self, user_id: &str, at: DateTime<Utc>) -> bool {
        self.user_id.as_deref().is_none_or(|u| u == user_id)
            && self.since.is_none_or(|since| at >= since)
    }
}

pub trait HistoryStore: Send + Sync {
    /// Register the user if unseen, otherwise bump `last_seen_at`.
    fn touch_user(&self, user_id: &str, at: DateTime<Utc>) -> DopamindResult<()>;

    fn user_exists(&self, user_id: &str) -> DopamindResult<bool>;

    /// Persist the emotion and dopamine rows for one processed reward.
    fn record_reward(&self, record: &RewardRecord<'_>) -> DopamindResult<MoodEntry>;

    /// Mood rows matching the query, oldest first.
    fn moods(&self, query: &HistoryQuery) -> DopamindResult<Vec<MoodEntry>>;

    fn record_session(&self, session: &SessionRecord) -> DopamindResult<()>;

    fn session_count(&self, query: &HistoryQuery) -> DopamindResult<usize>;
}

pub(crate) fn mood_from_record(record: &RewardRecord<'_>) -> MoodEntry {
    MoodEntry {
        id: Uuid::new_v4().to_string(),
        user_id: record.user_id.to_string(),
        reward_type: record.reward_type,
        emotion: record.emotion.emotion,
        intensity: record.emotion.intensity,
        confidence: record.emotion.confidence,
        dopamine_peak: Some(record.dopamine.peak),
        recorded_at: record.emotion.timestamp,
    }
}

#[derive(Debug, Default)]
struct HistoryInner {
    users: HashMap<String, DateTime<Utc>>,
    moods: Vec<MoodEntry>,
    sessions: Vec<SessionRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    inner: RwLock<HistoryInner>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built row, e.g. when seeding history.
    pub fn insert_mood(&self, entry: MoodEntry) -> DopamindResult<()> {
        let mut inner = self.inner.safe_write("history_store")?;
        inner
            .users
            .entry(entry.user_id.clone())
            .or_insert(entry.recorded_at);
        inner.moods.push(entry);
        Ok(())
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn touch_user(&self, user_id: &str, at: DateTime<Utc>) -> DopamindResult<()> {
        self.inner
            .safe_write("history_store")?
            .users
            .insert(user_id.to_string(), at);
        Ok(())
    }

    fn user_exists(&self, user_id: &str) -> DopamindResult<bool> {
        Ok(self
            .inner
            .safe_read("history_store")?
            .users
            .contains_key(user_id))
    }

    fn record_reward(&self, record: &RewardRecord<'_>) -> DopamindResult<MoodEntry> {
        let entry = mood_from_record(record);
        self.inner
            .safe_write("history_store")?
            .moods
            .push(entry.clone());
        Ok(entry)
    }

    fn moods(&self, query: &HistoryQuery) -> DopamindResult<Vec<MoodEntry>> {
        let inner = self.inner.safe_read("history_store")?;
        let mut rows: Vec<MoodEntry> = inner
            .moods
            .iter()
            .filter(|m| query.matches(&m.user_id, m.recorded_at))
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.recorded_at);
        Ok(rows)
    }

    fn record_session(&self, session: &SessionRecord) -> DopamindResult<()> {
        self.inner
            .safe_write("history_store")?
            .sessions
            .push(session.clone());
        Ok(())
    }

    fn session_count(&self, query: &HistoryQuery) -> DopamindResult<usize> {
        Ok(self
            .inner
            .safe_read("history_store")?
            .sessions
            .iter()
            .filter(|s| query.matches(&s.user_id, s.recorded_at))
            .count())
    }
}
