//! Turns raw JSON request bodies into typed requests.
//!
//! Bodies are taken as `serde_json::Value` so that every problem comes back
//! as a field-level validation error with a readable message rather than a
//! generic deserialisation failure.

use serde_json::{Map, Value};

use crate::errors::{DopamindError, DopamindResult};
use crate::reward::{RewardContext, RewardEvent, RewardType, SessionHistoryEntry};
use crate::session_summary::SessionData;

pub const MAX_USER_ID_LEN: usize = 128;

fn as_object<'a>(body: &'a Value, what: &str) -> DopamindResult<&'a Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| DopamindError::validation(what, format!("{what} must be a JSON object")))
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> DopamindResult<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(DopamindError::validation(
            field,
            format!("Missing required field: {field}"),
        )),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &str) -> DopamindResult<&'a str> {
    required(obj, field)?
        .as_str()
        .ok_or_else(|| DopamindError::validation(field, format!("{field} must be a string")))
}

pub fn validate_user_id(user_id: &str) -> DopamindResult<()> {
    if user_id.trim().is_empty() {
        return Err(DopamindError::validation("user_id", "user_id cannot be empty"));
    }
    if user_id.chars().count() > MAX_USER_ID_LEN {
        return Err(DopamindError::validation(
            "user_id",
            format!("user_id must be at most {MAX_USER_ID_LEN} characters"),
        ));
    }
    Ok(())
}

fn parse_context(value: &Value) -> DopamindResult<RewardContext> {
    let map = as_object(value, "context")?;
    RewardContext::from_map(map.clone())
}

fn parse_history(obj: &Map<String, Value>) -> DopamindResult<Vec<SessionHistoryEntry>> {
    match obj.get("session_history") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone()).map_err(|e| {
            DopamindError::validation(
                "session_history",
                format!("session_history entries must be objects with optional type and intensity: {e}"),
            )
        }),
        Some(_) => Err(DopamindError::validation(
            "session_history",
            "session_history must be a list",
        )),
    }
}

/// Body of `process-reward`, `emotion-prediction`, and each batch element.
pub fn parse_reward_request(body: &Value) -> DopamindResult<RewardEvent> {
    let obj = as_object(body, "request body")?;

    let user_id = required_str(obj, "user_id")?;
    let reward_type = required_str(obj, "reward_type")?;
    let context = required(obj, "context")?;

    validate_user_id(user_id)?;
    let reward_type: RewardType = reward_type.parse()?;
    let context = parse_context(context)?;
    let history = parse_history(obj)?;

    Ok(RewardEvent::new(user_id, reward_type, context).with_history(history))
}

/// Body of `session-summary`.
pub fn parse_session_request(body: &Value) -> DopamindResult<(String, SessionData)> {
    let obj = as_object(body, "request body")?;
    let user_id = required_str(obj, "user_id")?;
    let session_data = required(obj, "session_data")?;

    validate_user_id(user_id)?;
    as_object(session_data, "session_data")?;
    let data: SessionData = serde_json::from_value(session_data.clone()).map_err(|e| {
        DopamindError::validation("session_data", format!("Invalid session_data: {e}"))
    })?;
    data.validate()?;

    Ok((user_id.to_string(), data))
}

/// Body of `batch-process`: the raw elements, each validated later on its own.
pub fn parse_batch_request(body: &Value, max_batch_size: usize) -> DopamindResult<&[Value]> {
    let obj = as_object(body, "request body")?;
    let rewards = required(obj, "rewards")?
        .as_array()
        .ok_or_else(|| DopamindError::validation("rewards", "rewards must be a list"))?;
    if rewards.len() > max_batch_size {
        return Err(DopamindError::validation(
            "rewards",
            format!(
                "Batch of {} rewards exceeds the maximum of {max_batch_size}",
                rewards.len()
            ),
        ));
    }
    Ok(rewards.as_slice())
}
