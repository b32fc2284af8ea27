use std::sync::Arc;

use crate::config::DopamindConfig;
use crate::dopamind_core::DopamindCore;
use crate::errors::DopamindResult;

pub struct AppState {
    pub core: Arc<DopamindCore>,
    pub config: DopamindConfig,
}

impl AppState {
    pub fn new(core: Arc<DopamindCore>, config: DopamindConfig) -> Self {
        Self { core, config }
    }

    /// Build the engine and its storage backends from configuration.
    pub fn from_config(config: DopamindConfig) -> DopamindResult<Self> {
        let core = DopamindCore::from_config(&config)?;
        Ok(Self::new(Arc::new(core), config))
    }

    /// In-memory state with default settings, for tests and quick runs.
    pub fn in_memory() -> DopamindResult<Self> {
        Ok(Self::new(
            Arc::new(DopamindCore::in_memory()?),
            DopamindConfig::default(),
        ))
    }
}
