//! Per-user adaptive weights nudged by an exponential moving average of the
//! intensities observed for each reward type.

use std::sync::{Arc, Mutex};

use crate::errors::{DopamindError, DopamindResult, SafeLock};
use crate::reward::RewardType;
use crate::weight_store::{UserWeights, WeightStore};

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

pub struct AdaptiveWeights {
    store: Arc<dyn WeightStore>,
    learning_rate: f64,
    /// Serialises read-modify-write cycles against the store.
    update_lock: Mutex<()>,
}

impl AdaptiveWeights {
    pub fn new(store: Arc<dyn WeightStore>, learning_rate: f64) -> DopamindResult<Self> {
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(DopamindError::config(format!(
                "learning rate must be in (0, 1], got {learning_rate}"
            )));
        }
        Ok(Self {
            store,
            learning_rate,
            update_lock: Mutex::new(()),
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn get_weight(&self, user_id: &str, reward_type: RewardType) -> DopamindResult<f64> {
        Ok(self.weights_for(user_id)?.get(reward_type))
    }

    /// Snapshot of a user's weights; unknown users get an empty record.
    pub fn weights_for(&self, user_id: &str) -> DopamindResult<UserWeights> {
        Ok(self
            .store
            .load(user_id)?
            .unwrap_or_else(|| UserWeights::new(user_id)))
    }

    /// Apply one EMA step and return the new weight.
    pub fn update_weights(
        &self,
        user_id: &str,
        reward_type: RewardType,
        observed_intensity: f64,
    ) -> DopamindResult<f64> {
        let observed = observed_intensity.clamp(0.0, 1.0);

        let _guard = self.update_lock.safe_lock("adaptive_weights")?;
        let mut weights = self.weights_for(user_id)?;
        let current = weights.get(reward_type);
        let next = current * (1.0 - self.learning_rate) + observed * self.learning_rate;
        weights.set(reward_type, next);
        self.store.save(&weights)?;

        tracing::debug!(
            user_id,
            reward_type = reward_type.as_str(),
            from = current,
            to = next,
            "adaptive weight updated"
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight_store::InMemoryWeightStore;

    fn engine() -> AdaptiveWeights {
        AdaptiveWeights::new(Arc::new(InMemoryWeightStore::new()), DEFAULT_LEARNING_RATE).unwrap()
    }

    #[test]
    fn unknown_users_start_at_one() {
        assert_eq!(engine().get_weight("nobody", RewardType::Like).unwrap(), 1.0);
    }

    #[test]
    fn single_update_follows_ema() {
        let e = engine();
        let w = e.update_weights("u", RewardType::Like, 0.5).unwrap();
        assert!((w - 0.95).abs() < 1e-12);
        assert!((e.get_weight("u", RewardType::Like).unwrap() - 0.95).abs() < 1e-12);
        // Other reward types are untouched.
        assert_eq!(e.get_weight("u", RewardType::Share).unwrap(), 1.0);
    }

    #[test]
    fn repeated_observations_converge_monotonically() {
        let e = engine();
        let target = 0.3;
        let mut previous = e.get_weight("u", RewardType::Comment).unwrap();
        for _ in 0..200 {
            let next = e.update_weights("u", RewardType::Comment, target).unwrap();
            assert!(next <= previous + 1e-12);
            assert!(next >= target - 1e-12);
            previous = next;
        }
        assert!((previous - target).abs() < 1e-6);
    }

    #[test]
    fn observations_are_clamped() {
        let e = engine();
        let w = e.update_weights("u", RewardType::Like, 7.0).unwrap();
        assert!((w - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_learning_rate() {
        let store: Arc<dyn WeightStore> = Arc::new(InMemoryWeightStore::new());
        assert!(AdaptiveWeights::new(store.clone(), 0.0).is_err());
        assert!(AdaptiveWeights::new(store, 1.5).is_err());
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let e = Arc::new(engine());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let e = e.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        e.update_weights("shared", RewardType::Streak, 0.0).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let expected = 0.9f64.powi(200);
        let actual = e.get_weight("shared", RewardType::Streak).unwrap();
        assert!((actual - expected).abs() < 1e-9);
    }
}
