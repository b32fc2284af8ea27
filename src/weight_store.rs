use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::errors::{DopamindResult, SafeReadLock, SafeWriteLock};
use crate::reward::RewardType;

/// Weight every reward type starts from.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Per-user adaptive weights, one scalar per reward type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWeights {
    pub user_id: String,
    pub weights: BTreeMap<RewardType, f64>,
    pub updated_at: DateTime<Utc>,
}

impl UserWeights {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            weights: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn get(&self, reward_type: RewardType) -> f64 {
        self.weights
            .get(&reward_type)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn set(&mut self, reward_type: RewardType, weight: f64) {
        self.weights.insert(reward_type, weight);
        self.updated_at = Utc::now();
    }
}

/// Key-value capability backing the adaptive weights, keyed by user id.
pub trait WeightStore: Send + Sync {
    fn load(&self, user_id: &str) -> DopamindResult<Option<UserWeights>>;

    fn save(&self, weights: &UserWeights) -> DopamindResult<()>;

    fn user_count(&self) -> DopamindResult<usize>;
}

/// Process-local store; contents vanish on restart.
#[derive(Debug, Default)]
pub struct InMemoryWeightStore {
    users: RwLock<HashMap<String, UserWeights>>,
}

impl InMemoryWeightStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WeightStore for InMemoryWeightStore {
    fn load(&self, user_id: &str) -> DopamindResult<Option<UserWeights>> {
        Ok(self.users.safe_read("weight_store")?.get(user_id).cloned())
    }

    fn save(&self, weights: &UserWeights) -> DopamindResult<()> {
        self.users
            .safe_write("weight_store")?
            .insert(weights.user_id.clone(), weights.clone());
        Ok(())
    }

    fn user_count(&self) -> DopamindResult<usize> {
        Ok(self.users.safe_read("weight_store")?.len())
    }
}
