//! `/metadata` and `/download` handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::error::ApiError;
use super::state::SharedState;
use crate::fetch::{ProbeResult, content_disposition};

const MISSING_URL: &str = "Parameter ?url= wajib";

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    url: Option<String>,
    filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    ok: bool,
    #[serde(flatten)]
    probe: ProbeResult,
}

fn required_url(url: Option<String>) -> Result<String, ApiError> {
    url.filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request(MISSING_URL))
}

#[instrument(skip(state))]
pub async fn metadata(
    State(state): State<SharedState>,
    query: Result<Query<MetadataQuery>, QueryRejection>,
) -> Result<Json<MetadataResponse>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::bad_request(MISSING_URL))?;
    let url = required_url(query.url)?;
    let target = state.client.validate(&url).await?;
    let probe = state.client.probe(&target).await?;
    Ok(Json(MetadataResponse { ok: true, probe }))
}

#[instrument(skip(state))]
pub async fn download(
    State(state): State<SharedState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::bad_request(MISSING_URL))?;
    let url = required_url(query.url)?;
    let target = state.client.validate(&url).await?;
    let download = state
        .client
        .open_download(&target, query.filename.as_deref(), state.limits)
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&download.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    if let Some(length) = download.content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }
    // Percent-encoded, so always visible ASCII.
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&download.filename)) {
        headers.insert(CONTENT_DISPOSITION, value);
    }

    info!(
        url = %target,
        filename = %download.filename,
        content_length = ?download.content_length,
        "streaming download"
    );
    Ok((headers, Body::from_stream(download.body)).into_response())
}
