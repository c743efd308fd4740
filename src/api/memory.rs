//! `/memory` key/value handlers.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::auth::RequireApiKey;
use super::error::ApiError;
use super::state::SharedState;

const MISSING_KEY: &str = "key wajib";

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SetInput {
    key: Option<String>,
    #[serde(default)]
    value: Value,
    /// Seconds; anything but a positive number means no expiry.
    #[serde(default)]
    ttl: Value,
}

#[derive(Debug, Serialize)]
pub struct KvResponse {
    ok: bool,
    value: Value,
}

/// A query string that does not deserialize has no usable key.
fn query_key(query: Result<Query<KeyQuery>, QueryRejection>) -> Result<String, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::bad_request(MISSING_KEY))?;
    required_key(query.key)
}

fn required_key(key: Option<String>) -> Result<String, ApiError> {
    key.filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::bad_request(MISSING_KEY))
}

/// Positive, finite numbers only.
fn ttl_from(value: &Value) -> Option<Duration> {
    value
        .as_f64()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

pub async fn get(
    State(state): State<SharedState>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Json<KvResponse>, ApiError> {
    let key = query_key(query)?;
    let value = state.kv.get(&key).await?.unwrap_or(Value::Null);
    Ok(Json(KvResponse { ok: true, value }))
}

pub async fn set(
    _: RequireApiKey,
    State(state): State<SharedState>,
    payload: Result<Json<SetInput>, JsonRejection>,
) -> Result<Json<KvResponse>, ApiError> {
    let input = payload.map(|Json(input)| input).unwrap_or_default();
    let key = required_key(input.key)?;
    state
        .kv
        .set(&key, input.value, ttl_from(&input.ttl))
        .await?;
    Ok(Json(KvResponse {
        ok: true,
        value: Value::Bool(true),
    }))
}

pub async fn delete(
    _: RequireApiKey,
    State(state): State<SharedState>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Json<KvResponse>, ApiError> {
    let key = query_key(query)?;
    state.kv.delete(&key).await?;
    Ok(Json(KvResponse {
        ok: true,
        value: Value::Bool(true),
    }))
}
