//! Library root for the `dopamind` crate
//! Reward scoring engine, persistence, and HTTP API for the Dopamind app

// Core error handling
pub mod api_errors;
pub mod errors;

// Scoring
pub mod dopamine;
pub mod emotion;
pub mod reward;

// Adaptive weights
pub mod adaptive;
pub mod weight_store;
pub mod weight_store_sled;

// History & analytics
pub mod analytics;
pub mod history_store;
pub mod history_store_sqlite;
pub mod migrations;
pub mod session_summary;

// Configuration & CLI
pub mod cli;
pub mod config;
pub mod config_loader;

// Runtime core
pub mod dopamind_core;
pub mod validation;

// Web server interface
pub mod api;
pub mod app_state;
pub mod web;

// Logging
pub mod log_sink;

#[cfg(test)]
mod tests {
    pub mod history_store_sqlite;
    pub mod weight_store_sled;
}

pub use dopamind_core::DopamindCore;
pub use errors::{DopamindError, DopamindResult};
pub use reward::{EmotionType, RewardContext, RewardEvent, RewardType};
