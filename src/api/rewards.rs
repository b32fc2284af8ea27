use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    api_errors::AppError,
    app_state::AppState,
    dopamind_core::{Prediction, ProcessedReward},
    validation::{parse_batch_request, parse_reward_request},
};

pub async fn process_reward(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProcessedReward>, AppError> {
    let Json(body) = body?;
    let event = parse_reward_request(&body)?;
    Ok(Json(st.core.process_reward(&event)?))
}

pub async fn emotion_prediction(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Prediction>, AppError> {
    let Json(body) = body?;
    let event = parse_reward_request(&body)?;
    Ok(Json(st.core.predict(&event)?))
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub results: Vec<Value>,
    pub total_processed: usize,
    pub timestamp: String,
}

/// Each element runs on its own; a bad one is reported in place.
pub async fn batch_process(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchResponse>, AppError> {
    let Json(body) = body?;
    let items = parse_batch_request(&body, st.core.max_batch_size())?;

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let outcome = parse_reward_request(item).and_then(|event| st.core.process_reward(&event));
        match outcome {
            Ok(processed) => {
                let value = serde_json::to_value(&processed)
                    .map_err(|e| AppError::internal(format!("serialising batch result: {e}")))?;
                results.push(value);
            }
            Err(err) => {
                tracing::warn!("batch element rejected: {err}");
                let failure = AppError::from(err).body();
                results.push(json!({
                    "error": failure.error,
                    "message": failure.message,
                    "reward_data": item,
                }));
            }
        }
    }

    tracing::info!(total = results.len(), "batch processed");
    Ok(Json(BatchResponse {
        total_processed: results.len(),
        results,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
