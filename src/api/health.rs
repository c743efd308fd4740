//! Liveness and auth probe handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::auth::RequireApiKey;
use super::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Health {
    ok: bool,
    /// Seconds since startup.
    uptime: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    ok: bool,
    auth_required: bool,
}

pub async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        ok: true,
        uptime: state.uptime().as_secs_f64(),
    })
}

pub async fn auth_me(_: RequireApiKey, State(state): State<SharedState>) -> Json<AuthStatus> {
    Json(AuthStatus {
        ok: true,
        auth_required: state.api_keys.is_required(),
    })
}
