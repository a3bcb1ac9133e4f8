use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// `remote` when a platform URL is configured, `in_memory` otherwise.
    pub platform: &'static str,
    /// Open intake sessions.
    pub active_sessions: usize,
}

/// GET /health -- returns service status.
///
/// The platform is not contacted; its outages surface per request.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let platform = if state.config.platform.url.is_some() {
        "remote"
    } else {
        "in_memory"
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        platform,
        active_sessions: state.sessions.len().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
