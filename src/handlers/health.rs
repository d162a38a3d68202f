//! Liveness probe.

use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// GET /health
///
/// Always 200 while the process is serving. `sessions` counts stored tokens,
/// including expired ones the sweeper has not reclaimed yet.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "sessions": state.sessions.len().await
    }))
}
