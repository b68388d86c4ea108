//! Session lifecycle endpoints.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use service_core::error::AppError;

use crate::AppState;

/// Response for session creation.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub message: String,
}

/// Message response for simple operations.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Context digest for a session.
#[derive(Debug, Serialize)]
pub struct SessionContextResponse {
    pub session_id: Uuid,
    pub message_count: usize,
    pub last_task_id: Option<i64>,
    pub last_operation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Create a new conversation session.
///
/// POST /sessions
pub async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let context = state.sessions.create_session(None);

    tracing::info!(session_id = %context.session_id, "Session created");

    Json(SessionResponse {
        session_id: context.session_id,
        message: "Session created successfully".to_string(),
    })
}

/// Delete a conversation session. Absent ids succeed.
///
/// DELETE /sessions/:session_id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Json<MessageResponse> {
    state.sessions.delete_session(session_id);

    Json(MessageResponse {
        message: format!("Session {session_id} deleted successfully"),
    })
}

/// Inspect a session's context.
///
/// GET /sessions/:session_id/context
pub async fn get_session_context(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionContextResponse>, AppError> {
    let context = state.sessions.get_session(session_id).ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Session {session_id} not found or expired"))
    })?;

    Ok(Json(SessionContextResponse {
        session_id: context.session_id,
        message_count: context.messages.len(),
        last_task_id: context.last_task_id,
        last_operation: context.last_operation.map(|op| op.as_str().to_string()),
        created_at: context.created_at,
        updated_at: context.updated_at,
        expires_at: context.expires_at,
    }))
}

/// Evict every expired session.
///
/// POST /sessions/cleanup
pub async fn cleanup_sessions(State(state): State<AppState>) -> Json<MessageResponse> {
    let removed = state.sessions.cleanup_expired();

    tracing::info!(removed, "Expired sessions cleaned up");

    Json(MessageResponse {
        message: "Expired sessions cleaned up successfully".to_string(),
    })
}
