use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    api::{
        analytics::{global_insights, user_analytics},
        health::health,
        rewards::{batch_process, emotion_prediction, process_reward},
        session::session_summary,
        weights::user_weights,
    },
    api_errors::{unknown_route, wrong_method, AppError},
    app_state::AppState,
};

/// Router exposing every endpoint of the scoring service.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/process-reward", post(process_reward))
        .route("/api/emotion-prediction", post(emotion_prediction))
        .route("/api/batch-process", post(batch_process))
        .route("/api/analytics/{user_id}", get(user_analytics))
        .route("/api/insights", get(global_insights))
        .route("/api/session-summary", post(session_summary))
        .route("/api/weights/{user_id}", get(user_weights))
        .fallback(unknown_route)
        .method_not_allowed_fallback(wrong_method)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        // The mobile client calls from arbitrary origins.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::internal(format!("handler panicked: {detail}")).into_response()
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    tracing::info!("HTTP server listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
