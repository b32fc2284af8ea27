use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    api_errors::AppError, app_state::AppState, validation::validate_user_id,
    weight_store::UserWeights,
};

/// Current adaptive weights; users never seen get an empty map.
pub async fn user_weights(
    State(st): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserWeights>, AppError> {
    validate_user_id(&user_id)?;
    Ok(Json(st.core.weights(&user_id)?))
}
