// Service configuration sections. Loaded by `config_loader`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{DopamindError, DopamindResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DopamindConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub learning_rate: f64,
    /// Half-width of the uniform noise added to intensities; 0 disables it.
    pub jitter: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            learning_rate: crate::adaptive::DEFAULT_LEARNING_RATE,
            jitter: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightBackend {
    Memory,
    Sled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub weights: WeightBackend,
    pub history: HistoryBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            weights: WeightBackend::Memory,
            history: HistoryBackend::Memory,
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn weights_path(&self) -> PathBuf {
        self.data_dir.join("weights")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("dopamind"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub default_days: i64,
    /// Answer 404 for users the history store has never seen.
    pub require_known_user: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_days: 7,
            require_known_user: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DopamindConfig {
    /// Reject values the service cannot run with.
    pub fn validate(&self) -> DopamindResult<()> {
        if self.server.port == 0 {
            return Err(DopamindError::config("server.port must be non-zero"));
        }
        if self.server.host.trim().is_empty() {
            return Err(DopamindError::config("server.host cannot be empty"));
        }
        if self.server.max_batch_size == 0 {
            return Err(DopamindError::config("server.max_batch_size must be at least 1"));
        }
        let lr = self.scoring.learning_rate;
        if !(lr > 0.0 && lr <= 1.0) {
            return Err(DopamindError::config(format!(
                "scoring.learning_rate must be in (0, 1], got {lr}"
            )));
        }
        let jitter = self.scoring.jitter;
        if !(0.0..=0.5).contains(&jitter) {
            return Err(DopamindError::config(format!(
                "scoring.jitter must be in [0, 0.5], got {jitter}"
            )));
        }
        crate::analytics::validate_days(self.analytics.default_days)
            .map_err(|_| DopamindError::config("analytics.default_days must be between 1 and 365"))?;
        if self.logging.level.trim().is_empty() {
            return Err(DopamindError::config("logging.level cannot be empty"));
        }
        Ok(())
    }
}
