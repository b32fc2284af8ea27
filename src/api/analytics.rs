use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    api_errors::AppError,
    app_state::AppState,
    dopamind_core::{GlobalInsights, UserAnalytics},
    validation::validate_user_id,
};

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    pub days: Option<i64>,
}

pub async fn user_analytics(
    State(st): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    params: Result<Query<AnalyticsParams>, QueryRejection>,
) -> Result<Json<UserAnalytics>, AppError> {
    let Query(params) = params?;
    validate_user_id(&user_id)?;
    Ok(Json(st.core.analytics(&user_id, params.days)?))
}

pub async fn global_insights(
    State(st): State<Arc<AppState>>,
) -> Result<Json<GlobalInsights>, AppError> {
    Ok(Json(st.core.insights()?))
}
