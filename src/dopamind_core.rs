//! dopamind_core.rs
//! Scoring engine behind both the HTTP API and the CLI.
//! Ties the emotion and dopamine scorers to adaptive weights and history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adaptive::AdaptiveWeights;
use crate::analytics::{get_global_trends, get_insights, get_trends, TrendSummary};
use crate::config::{DopamindConfig, HistoryBackend, WeightBackend};
use crate::dopamine::{score_dopamine, DopamineResult};
use crate::emotion::{EmotionResult, EmotionScorer};
use crate::errors::{DopamindError, DopamindResult};
use crate::history_store::{HistoryStore, InMemoryHistoryStore, RewardRecord, SessionRecord};
use crate::history_store_sqlite::SqliteHistoryStore;
use crate::reward::{RewardContext, RewardEvent};
use crate::session_summary::{summarize_session, SessionData, SessionSummary};
use crate::weight_store::{InMemoryWeightStore, UserWeights, WeightStore};
use crate::weight_store_sled::SledWeightStore;

/// Outcome of the full process-reward pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedReward {
    pub emotion: EmotionResult,
    pub dopamine: DopamineResult,
    pub context: RewardContext,
    pub user_id: String,
}

/// Side-effect-free preview of how a reward would land.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub emotion: EmotionResult,
    pub dopamine: DopamineResult,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAnalytics {
    pub trends: TrendSummary,
    pub insights: Vec<String>,
    pub user_id: String,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalInsights {
    pub insights: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

pub struct DopamindCore {
    scorer: EmotionScorer,
    weights: AdaptiveWeights,
    history: Arc<dyn HistoryStore>,
    require_known_user: bool,
    default_days: i64,
    max_batch_size: usize,
}

impl DopamindCore {
    pub fn new(
        weight_store: Arc<dyn WeightStore>,
        history: Arc<dyn HistoryStore>,
        config: &DopamindConfig,
    ) -> DopamindResult<Self> {
        Ok(Self {
            scorer: EmotionScorer::new(config.scoring.jitter),
            weights: AdaptiveWeights::new(weight_store, config.scoring.learning_rate)?,
            history,
            require_known_user: config.analytics.require_known_user,
            default_days: config.analytics.default_days,
            max_batch_size: config.server.max_batch_size,
        })
    }

    /// Open the storage backends named in `config.storage`.
    pub fn from_config(config: &DopamindConfig) -> DopamindResult<Self> {
        let storage = &config.storage;

        let weight_store: Arc<dyn WeightStore> = match storage.weights {
            WeightBackend::Memory => Arc::new(InMemoryWeightStore::new()),
            WeightBackend::Sled => Arc::new(SledWeightStore::open(storage.weights_path())?),
        };
        let history: Arc<dyn HistoryStore> = match storage.history {
            HistoryBackend::Memory => Arc::new(InMemoryHistoryStore::new()),
            HistoryBackend::Sqlite => Arc::new(SqliteHistoryStore::open(storage.history_path())?),
        };

        info!(
            weights = ?storage.weights,
            history = ?storage.history,
            data_dir = %storage.data_dir.display(),
            "scoring engine initialised"
        );
        Self::new(weight_store, history, config)
    }

    /// Engine for one-off predictions. History stays in memory and an existing
    /// sled weight store is only read; nothing is created on disk.
    pub fn for_prediction(config: &DopamindConfig) -> DopamindResult<Self> {
        let path = config.storage.weights_path();
        let weight_store: Arc<dyn WeightStore> = match config.storage.weights {
            WeightBackend::Sled if path.exists() => match SledWeightStore::open(&path) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("weight store unavailable, using default weights: {e}");
                    Arc::new(InMemoryWeightStore::new())
                }
            },
            _ => Arc::new(InMemoryWeightStore::new()),
        };
        Self::new(weight_store, Arc::new(InMemoryHistoryStore::new()), config)
    }

    /// Everything in memory, default settings.
    pub fn in_memory() -> DopamindResult<Self> {
        Self::new(
            Arc::new(InMemoryWeightStore::new()),
            Arc::new(InMemoryHistoryStore::new()),
            &DopamindConfig::default(),
        )
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn default_days(&self) -> i64 {
        self.default_days
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    fn score(&self, event: &RewardEvent) -> DopamindResult<(EmotionResult, DopamineResult, f64)> {
        let weight = self.weights.get_weight(&event.user_id, event.reward_type)?;
        let scored = self
            .scorer
            .score(event.reward_type, &event.context, &event.session_history, weight);
        let dopamine = score_dopamine(
            &scored.result,
            event.reward_type,
            &event.context,
            &event.session_history,
        );
        Ok((scored.result, dopamine, scored.raw_intensity))
    }

    /// Score, adapt the user's weight, and persist the result.
    pub fn process_reward(&self, event: &RewardEvent) -> DopamindResult<ProcessedReward> {
        let (emotion, dopamine, raw_intensity) = self.score(event)?;

        // History first: a failed write must leave the weight where it was.
        self.history.touch_user(&event.user_id, event.timestamp)?;
        self.history.record_reward(&RewardRecord {
            user_id: &event.user_id,
            reward_type: event.reward_type,
            emotion: &emotion,
            dopamine: &dopamine,
        })?;

        // Learn from the unweighted response so the weight does not compound.
        self.weights
            .update_weights(&event.user_id, event.reward_type, raw_intensity)?;

        info!(
            user_id = %event.user_id,
            reward_type = event.reward_type.as_str(),
            emotion = emotion.emotion.as_str(),
            intensity = emotion.intensity,
            "reward processed"
        );

        Ok(ProcessedReward {
            emotion,
            dopamine,
            context: event.context.clone(),
            user_id: event.user_id.clone(),
        })
    }

    pub fn predict(&self, event: &RewardEvent) -> DopamindResult<Prediction> {
        let (emotion, dopamine, _) = self.score(event)?;
        debug!(user_id = %event.user_id, reward_type = event.reward_type.as_str(), "prediction");
        Ok(Prediction {
            emotion,
            dopamine,
            user_id: event.user_id.clone(),
        })
    }

    pub fn analytics(&self, user_id: &str, days: Option<i64>) -> DopamindResult<UserAnalytics> {
        let days = days.unwrap_or(self.default_days);
        if self.require_known_user && !self.history.user_exists(user_id)? {
            return Err(DopamindError::not_found("User", user_id));
        }
        let trends = get_trends(self.history.as_ref(), user_id, days, Utc::now())?;
        let insights = get_insights(&trends);
        Ok(UserAnalytics {
            trends,
            insights,
            user_id: user_id.to_string(),
            days,
        })
    }

    pub fn insights(&self) -> DopamindResult<GlobalInsights> {
        let trends = get_global_trends(self.history.as_ref())?;
        Ok(GlobalInsights {
            insights: get_insights(&trends),
            timestamp: Utc::now(),
        })
    }

    /// Summarise a finished session and keep a record of it.
    pub fn summarize_session(&self, user_id: &str, data: &SessionData) -> DopamindResult<SessionSummary> {
        let summary = summarize_session(data)?;
        let now = Utc::now();
        let metrics = &summary.session_metrics;

        self.history.touch_user(user_id, now)?;
        self.history.record_session(&SessionRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            duration: metrics.session_duration,
            total_rewards: metrics.total_rewards,
            average_intensity: metrics.average_intensity,
            focus_mode: metrics.focus_mode,
            dopamine_trend: metrics.dopamine_trend.as_str().to_string(),
            recorded_at: now,
        })?;

        info!(
            user_id,
            total_rewards = metrics.total_rewards,
            trend = metrics.dopamine_trend.as_str(),
            "session summarised"
        );
        Ok(summary)
    }

    pub fn weights(&self, user_id: &str) -> DopamindResult<UserWeights> {
        self.weights.weights_for(user_id)
    }
}
