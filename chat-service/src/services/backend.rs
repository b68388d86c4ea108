//! Authenticated REST client for the task backend.
//!
//! One instance is built per chat turn, carrying the caller's bearer token.
//! The backend is an external collaborator: everything it reports comes back
//! through the `BackendError` taxonomy, never as a raw transport error.

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::config::BackendSettings;

/// Errors surfaced by the task backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Authentication failed. Token may be expired.")]
    Authentication,

    #[error("Resource not found")]
    NotFound,

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    token: String,
    client: Client,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, BackendError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Self::parse_body(Self::check_status(response).await?).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Self::parse_body(Self::check_status(response).await?).await
    }

    /// PATCH with an optional body; the toggle endpoint takes none.
    pub async fn patch(&self, path: &str, body: Option<&Value>) -> Result<Value, BackendError> {
        let mut request = self.client.patch(self.url(path)).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Self::parse_body(Self::check_status(response).await?).await
    }

    /// DELETE returns no body (204).
    pub async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map non-2xx statuses onto the backend error taxonomy. The generic
    /// branch carries the response's `detail` field when the body is JSON,
    /// else the raw body.
    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Authentication);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|value| {
                    value
                        .get("detail")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(body);
            return Err(BackendError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    async fn parse_body(response: Response) -> Result<Value, BackendError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to parse response: {e}")))
    }
}
