//! `/scrape` handler.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::state::SharedState;
use crate::scrape::PageSummary;

const MISSING_URL: &str = "Parameter ?url= wajib";

#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    ok: bool,
    #[serde(flatten)]
    summary: PageSummary,
}

pub async fn scrape(
    State(state): State<SharedState>,
    query: Result<Query<ScrapeQuery>, QueryRejection>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::bad_request(MISSING_URL))?;
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request(MISSING_URL))?;
    let summary = state.inspector.inspect(&url).await?;
    Ok(Json(ScrapeResponse { ok: true, summary }))
}
