//! The conversational endpoint.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use service_core::error::AppError;

use crate::agent::TaskAgent;
use crate::services::BackendClient;
use crate::tools::ToolExecutor;
use crate::AppState;

/// Chat request: a message and, to continue a conversation, a session id.
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub message: String,
    pub session_id: Option<Uuid>,
}

/// Chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: Uuid,
}

/// Process one chat message. The bearer credential is forwarded verbatim to
/// the task backend for the turn's tool calls.
///
/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request.validate()?;
    let token = bearer_token(&headers)?;

    let mut context = match request.session_id {
        Some(session_id) => state.sessions.get_session(session_id).ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Session {session_id} not found or expired"))
        })?,
        None => state.sessions.create_session(None),
    };

    let backend = BackendClient::new(&state.config.backend, token);
    let agent = TaskAgent::new(state.provider.clone(), ToolExecutor::new(backend));

    let response = agent.process_message(&mut context, &request.message).await;

    let session_id = context.session_id;
    state.sessions.update_session(context);

    Ok(Json(ChatResponse {
        response,
        session_id,
    }))
}

/// Pull the bearer token out of the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!(
                "Invalid authorization header format. Expected 'Bearer <token>'"
            ))
        })?;

    if token.is_empty() {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Bearer token is required"
        )));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );

        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn wrong_scheme_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc123"),
        );

        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn empty_token_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));

        assert!(bearer_token(&headers).is_err());
    }
}
