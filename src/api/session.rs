use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    api_errors::AppError, app_state::AppState, session_summary::SessionSummary,
    validation::parse_session_request,
};

#[derive(Serialize)]
pub struct SessionSummaryResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub timestamp: String,
}

pub async fn session_summary(
    State(st): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SessionSummaryResponse>, AppError> {
    let Json(body) = body?;
    let (user_id, data) = parse_session_request(&body)?;
    let summary = st.core.summarize_session(&user_id, &data)?;
    Ok(Json(SessionSummaryResponse {
        user_id,
        summary,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
