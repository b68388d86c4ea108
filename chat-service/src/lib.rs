//! chat-service: conversational task management.
//!
//! Translates natural-language messages into CRUD calls against the task
//! backend through an LLM function-calling agent, with per-session
//! conversation context held in memory.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod handlers;
pub mod services;
pub mod tools;

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::request_id_middleware;

use crate::config::ChatConfig;
use crate::conversation::SessionStore;
use crate::services::providers::ChatProvider;

/// Shared application state. The session store is the only mutable piece;
/// it is handed to every handler through this state rather than living in a
/// process-wide global.
#[derive(Clone)]
pub struct AppState {
    pub config: ChatConfig,
    pub sessions: SessionStore,
    pub provider: Arc<dyn ChatProvider>,
}

/// Build the HTTP router for the chat service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/sessions", post(handlers::sessions::create_session))
        .route("/sessions/cleanup", post(handlers::sessions::cleanup_sessions))
        .route(
            "/sessions/:session_id",
            delete(handlers::sessions::delete_session),
        )
        .route(
            "/sessions/:session_id/context",
            get(handlers::sessions::get_session_context),
        )
        .route("/chat", post(handlers::chat::chat))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
