//! Service descriptor and liveness endpoints.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// Root endpoint.
///
/// GET /
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "Todo Chatbot API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Health check endpoint for probes.
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "backend_url": state.config.backend.base_url,
        "model": state.config.openai.model
    }))
}
