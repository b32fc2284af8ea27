use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::DopamindError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("endpoint not found")]
    UnknownRoute,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::UnknownRoute => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body of the `{error, message, timestamp}` error shape.
    pub fn body(&self) -> ErrBody {
        let (error, message) = match self {
            AppError::BadRequest(s) => ("Validation error", s.clone()),
            AppError::NotFound(s) => ("Not found", s.clone()),
            AppError::UnknownRoute => (
                "Endpoint not found",
                "The requested endpoint does not exist".to_string(),
            ),
            AppError::MethodNotAllowed => (
                "Method not allowed",
                "The endpoint does not accept this HTTP method".to_string(),
            ),
            // Internal details stay in the logs.
            AppError::Internal(_) => (
                "Internal server error",
                "An unexpected error occurred".to_string(),
            ),
        };
        ErrBody {
            error: error.to_string(),
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrBody {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => tracing::error!("request failed: {detail}"),
            AppError::BadRequest(detail) => tracing::warn!("request rejected: {detail}"),
            _ => {}
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<DopamindError> for AppError {
    fn from(err: DopamindError) -> Self {
        match err {
            DopamindError::Validation { message, .. } => AppError::BadRequest(message),
            DopamindError::NotFound { resource, id } => {
                AppError::NotFound(format!("{resource} '{id}' not found"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query parameters: {}", rejection.body_text()))
    }
}

/// Fallback handler for unmatched routes
pub async fn unknown_route() -> AppError {
    AppError::UnknownRoute
}

/// Fallback for a known path called with the wrong method
pub async fn wrong_method() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request_with_detail() {
        let err: AppError = DopamindError::validation("user_id", "Missing required field: user_id").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().message, "Missing required field: user_id");
    }

    #[test]
    fn internal_errors_hide_detail() {
        let err: AppError = DopamindError::internal("sqlite exploded").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body.error, "Internal server error");
        assert!(!body.message.contains("sqlite"));
    }

    #[test]
    fn not_found_maps_to_404() {
        let err: AppError = DopamindError::not_found("user", "ghost").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.body().message.contains("ghost"));
    }
}
