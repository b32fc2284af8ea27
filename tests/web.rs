// tests/web.rs
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dopamind::app_state::AppState;
use dopamind::config::DopamindConfig;
use dopamind::history_store::InMemoryHistoryStore;
use dopamind::weight_store::InMemoryWeightStore;
use dopamind::web::build_router;
use dopamind::DopamindCore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for .oneshot()

fn app() -> Router {
    let state = AppState::in_memory().expect("state init");
    build_router(Arc::new(state))
}

fn app_with(config: DopamindConfig) -> Router {
    let core = DopamindCore::new(
        Arc::new(InMemoryWeightStore::new()),
        Arc::new(InMemoryHistoryStore::new()),
        &config,
    )
    .expect("core init");
    build_router(Arc::new(AppState::new(Arc::new(core), config)))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

async fn post(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    send(app, req).await
}

fn assert_error_shape(body: &Value) {
    assert!(body["error"].is_string(), "missing error in {body}");
    assert!(body["message"].is_string(), "missing message in {body}");
    let ts = body["timestamp"].as_str().expect("timestamp");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[tokio::test]
async fn health_reports_version() {
    let (status, body) = get(&app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "1.0.0");
    let ts = body["timestamp"].as_str().expect("timestamp");
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
}

#[tokio::test]
async fn process_reward_returns_scored_response() {
    let app = app();
    let (status, body) = post(
        &app,
        "/api/process-reward",
        json!({"user_id": "u1", "reward_type": "like", "context": {"device": "android"}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u1");
    assert_eq!(body["emotion"]["type"], "happy");
    assert!((body["emotion"]["intensity"].as_f64().unwrap() - 0.8).abs() < 1e-9);
    assert!((body["emotion"]["confidence"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    for key in ["baseline", "peak", "duration", "decay_rate", "emotional_impact"] {
        assert!(body["dopamine"][key].is_number(), "dopamine.{key} missing");
    }
    assert_eq!(body["context"], json!({"device": "android"}));
}

#[tokio::test]
async fn unknown_reward_type_is_rejected_with_valid_list() {
    let (status, body) = post(
        &app(),
        "/api/process-reward",
        json!({"user_id": "u1", "reward_type": "flying", "context": {}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);
    let message = body["message"].as_str().unwrap();
    for name in [
        "like", "comment", "share", "achievement", "connection", "discovery", "streak", "milestone",
    ] {
        assert!(message.contains(name), "{message} should list {name}");
    }
}

#[tokio::test]
async fn missing_field_is_named() {
    let (status, body) = post(
        &app(),
        "/api/process-reward",
        json!({"reward_type": "like", "context": {}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required field: user_id");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let req = Request::builder()
        .uri("/api/process-reward")
        .method("POST")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);
}

#[tokio::test]
async fn batch_of_two_processes_both() {
    let (status, body) = post(
        &app(),
        "/api/batch-process",
        json!({"rewards": [
            {"user_id": "u1", "reward_type": "like", "context": {}},
            {"user_id": "u2", "reward_type": "share", "context": {"mood": "positive"}}
        ]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_processed"], 2);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        assert!(result["emotion"]["type"].is_string());
        assert!(result["dopamine"]["peak"].is_number());
        assert!(result["user_id"].is_string());
    }
}

#[tokio::test]
async fn batch_isolates_bad_elements() {
    let bad = json!({"user_id": "u1", "reward_type": "flying", "context": {}});
    let (status, body) = post(
        &app(),
        "/api/batch-process",
        json!({"rewards": [
            {"user_id": "u1", "reward_type": "like", "context": {}},
            bad.clone(),
            {"user_id": "u1", "reward_type": "comment", "context": {}}
        ]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_processed"], 3);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["emotion"]["type"], "happy");
    assert_eq!(results[1]["error"], "Validation error");
    assert!(results[1]["message"].as_str().unwrap().contains("milestone"));
    assert_eq!(results[1]["reward_data"], bad);
    assert_eq!(results[2]["emotion"]["type"], "excited");
}

#[tokio::test]
async fn oversized_batch_is_rejected() {
    let mut config = DopamindConfig::default();
    config.server.max_batch_size = 1;
    let (status, body) = post(
        &app_with(config),
        "/api/batch-process",
        json!({"rewards": [{}, {}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);
}

#[tokio::test]
async fn analytics_for_empty_history() {
    let (status, body) = get(&app(), "/api/analytics/newcomer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "newcomer");
    assert_eq!(body["days"], 7);
    assert_eq!(body["trends"]["total_entries"], 0);
    assert_eq!(body["trends"]["emotion_distribution"], json!({}));
    assert_eq!(body["insights"], json!([]));
}

#[tokio::test]
async fn analytics_rejects_bad_days() {
    let app = app();
    let (status, body) = get(&app, "/api/analytics/u1?days=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_shape(&body);

    let (status, _) = get(&app, "/api/analytics/u1?days=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analytics_reflect_processed_rewards() {
    let app = app();
    for _ in 0..2 {
        post(
            &app,
            "/api/process-reward",
            json!({"user_id": "u9", "reward_type": "like", "context": {}}),
        )
        .await;
    }
    let (status, body) = get(&app, "/api/analytics/u9?days=30").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 30);
    assert_eq!(body["trends"]["total_entries"], 2);
    assert_eq!(body["trends"]["emotion_distribution"]["happy"], 2);

    let (status, body) = get(&app, "/api/insights").await;
    assert_eq!(status, StatusCode::OK);
    let insights = body["insights"].as_array().unwrap();
    assert!(insights
        .iter()
        .any(|i| i.as_str().unwrap().contains("emotional variety")));
}

#[tokio::test]
async fn unknown_user_is_404_when_required() {
    let mut config = DopamindConfig::default();
    config.analytics.require_known_user = true;
    let (status, body) = get(&app_with(config), "/api/analytics/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error_shape(&body);
}

#[tokio::test]
async fn prediction_leaves_weights_untouched() {
    let app = app();
    let (status, body) = post(
        &app,
        "/api/emotion-prediction",
        json!({"user_id": "p1", "reward_type": "milestone", "context": {"time_of_day": "morning"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "p1");
    assert_eq!(body["emotion"]["type"], "excited");

    let (_, weights) = get(&app, "/api/weights/p1").await;
    assert_eq!(weights["weights"], json!({}));

    let (_, analytics) = get(&app, "/api/analytics/p1").await;
    assert_eq!(analytics["trends"]["total_entries"], 0);
}

#[tokio::test]
async fn processing_adapts_weights() {
    let app = app();
    post(
        &app,
        "/api/process-reward",
        json!({"user_id": "w1", "reward_type": "like", "context": {}}),
    )
    .await;
    let (status, body) = get(&app, "/api/weights/w1").await;
    assert_eq!(status, StatusCode::OK);
    let like = body["weights"]["like"].as_f64().unwrap();
    assert!((like - 0.98).abs() < 1e-9);
}

#[tokio::test]
async fn session_summary_round_trip() {
    let (status, body) = post(
        &app(),
        "/api/session-summary",
        json!({
            "user_id": "s1",
            "session_data": {
                "duration": 45,
                "rewards": [
                    {"type": "like", "intensity": 0.2},
                    {"type": "like", "intensity": 0.3},
                    {"type": "share", "intensity": 0.9}
                ]
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "s1");
    assert_eq!(body["session_metrics"]["total_rewards"], 3);
    assert_eq!(body["session_metrics"]["focus_mode"], false);
    assert_eq!(body["session_metrics"]["dopamine_trend"], "increasing");
    let recs = body["recommendations"].as_array().unwrap();
    assert!(recs
        .iter()
        .any(|r| r == "Try longer sessions for better habit formation"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn session_summary_requires_session_data() {
    let (status, body) = post(&app(), "/api/session-summary", json!({"user_id": "s1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required field: session_data");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, body) = get(&app(), "/api/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
    assert_error_shape(&body);
}

#[tokio::test]
async fn wrong_method_is_405_with_error_body() {
    let (status, body) = get(&app(), "/api/process-reward").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
    assert_error_shape(&body);
}

#[tokio::test]
async fn prediction_at_peak_hour_is_boosted() {
    let (status, body) = post(
        &app(),
        "/api/emotion-prediction",
        json!({"user_id": "p2", "reward_type": "like", "context": {"time_of_day": "morning"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!((body["emotion"]["intensity"].as_f64().unwrap() - 0.88).abs() < 1e-9);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let req = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:19006")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
