use sled::Db;
use std::path::Path;

use crate::errors::{DopamindError, DopamindResult};
use crate::weight_store::{UserWeights, WeightStore};

const WEIGHTS_TREE: &str = "user_weights";

/// A sled-backed implementation of WeightStore. Values are JSON encoded
/// `UserWeights` keyed by user id.
pub struct SledWeightStore {
    db: Db,
}

impl SledWeightStore {
    pub fn open<P: AsRef<Path>>(path: P) -> DopamindResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| {
            DopamindError::database(format!("opening weight store at {}", path.display()), e)
        })?;
        tracing::info!("Weight store opened at {}", path.display());
        Ok(Self { db })
    }

    fn tree(&self) -> DopamindResult<sled::Tree> {
        self.db
            .open_tree(WEIGHTS_TREE)
            .map_err(|e| DopamindError::database("opening user_weights tree", e))
    }
}

impl WeightStore for SledWeightStore {
    fn load(&self, user_id: &str) -> DopamindResult<Option<UserWeights>> {
        match self.tree()?.get(user_id.as_bytes())? {
            Some(bytes) => {
                let weights = serde_json::from_slice(&bytes)
                    .map_err(|e| DopamindError::serialization("decoding user weights", e))?;
                Ok(Some(weights))
            }
            None => Ok(None),
        }
    }

    fn save(&self, weights: &UserWeights) -> DopamindResult<()> {
        let bytes = serde_json::to_vec(weights)
            .map_err(|e| DopamindError::serialization("encoding user weights", e))?;
        let tree = self.tree()?;
        tree.insert(weights.user_id.as_bytes(), bytes)?;
        tree.flush()?;
        Ok(())
    }

    fn user_count(&self) -> DopamindResult<usize> {
        Ok(self.tree()?.len())
    }
}
