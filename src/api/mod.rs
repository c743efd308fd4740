//! HTTP surface.
//!
//! [`router`] wires every route twice: at the root and under `/api`.
//! Mutating routes take the [`RequireApiKey`] extractor; failures render
//! through [`ApiError`].

mod auth;
mod error;
mod fetch;
mod health;
mod memory;
mod notes;
mod scrape;
mod state;

pub use auth::RequireApiKey;
pub use error::ApiError;
pub use state::{AppState, SharedState};

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Prefix the routes are mounted under in addition to the root.
pub const API_PREFIX: &str = "/api";

fn routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/metadata", get(fetch::metadata))
        .route("/download", get(fetch::download))
        .route("/scrape", get(scrape::scrape))
        .route("/auth/me", get(health::auth_me))
        .route(
            "/memory",
            get(memory::get).post(memory::set).delete(memory::delete),
        )
        .route("/notes", get(notes::list).post(notes::create))
        .route(
            "/notes/{id}",
            get(notes::get).put(notes::update).delete(notes::delete),
        )
}

/// Builds the application router with request tracing.
pub fn router(state: AppState) -> Router {
    let state: SharedState = Arc::new(state);
    routes()
        .nest(API_PREFIX, routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
