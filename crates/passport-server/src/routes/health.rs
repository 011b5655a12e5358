//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness report.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` while sessions are being served, `"stopping"` once the
    /// session manager is torn down.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Number of live sessions.
    pub sessions: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.sessions.is_destroyed() {
        "stopping"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.sessions.len(),
    })
}

/// Routes outside the versioned API.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
