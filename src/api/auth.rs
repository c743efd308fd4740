//! `x-api-key` extractor for mutating routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use super::error::ApiError;
use super::state::SharedState;
use crate::auth::API_KEY_HEADER;

/// Present in a handler signature, rejects requests without a valid key.
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

impl FromRequestParts<SharedState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        if state.api_keys.allows(presented) {
            Ok(Self)
        } else {
            debug!(path = %parts.uri.path(), "rejected request without valid api key");
            Err(ApiError::unauthorized())
        }
    }
}
