//! Chat model providers.
//!
//! This module provides a trait-based abstraction for chat-completion
//! backends, allowing easy swapping between the real API and a scripted
//! mock.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

/// Error type for provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// A message in provider-neutral form. `tool_calls` is set on assistant
/// turns that requested tools; `tool_call_id` on tool-result turns.
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    pub role: String,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub tool_call_id: Option<String>,
}

impl ProviderMessage {
    pub fn plain(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool invocation requested by the model. `arguments` is the raw JSON
/// string from the wire, parsed only at execution time.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCallRequest {
    /// Recorded form for conversation history.
    pub fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": self.arguments,
            }
        })
    }
}

/// One assistant turn from the model: text, requested tools, or both.
#[derive(Debug, Clone, Default)]
pub struct ChatOutcome {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// Trait for chat-completion providers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one completion over the supplied messages. `tools` is the
    /// function catalog for automatic tool selection; pass an empty slice
    /// when tool selection is not wanted.
    async fn complete(
        &self,
        messages: &[ProviderMessage],
        tools: &[Value],
    ) -> Result<ChatOutcome, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
