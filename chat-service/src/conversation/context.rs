//! Per-session conversation context: bounded message history plus the task
//! referent carried across turns.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::clock::Clock;

/// Upper bound on retained history; older messages are dropped silently.
pub const MAX_CONTEXT_MESSAGES: usize = 10;

/// Idle lifetime of a session. Every appended message slides the deadline
/// forward by this much.
pub const SESSION_TTL_MINUTES: i64 = 30;

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// The kind of backend operation the conversation last referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOperation {
    Create,
    View,
    Update,
    Delete,
    Complete,
}

impl TaskOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOperation::Create => "create",
            TaskOperation::View => "view",
            TaskOperation::Update => "update",
            TaskOperation::Delete => "delete",
            TaskOperation::Complete => "complete",
        }
    }
}

/// A single message in a conversation. Immutable once appended; history is
/// append and truncate only.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Raw tool-call payloads recorded on the assistant turn that requested
    /// them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    /// Result envelopes recorded on the final assistant turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<Value>>,
}

/// Mutable per-session state. All time reads go through the injected clock.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub session_id: Uuid,
    pub user_id: Option<Uuid>,
    pub messages: Vec<ChatMessage>,
    pub last_task_id: Option<i64>,
    pub last_operation: Option<TaskOperation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
}

impl ConversationContext {
    pub fn new(user_id: Option<Uuid>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            messages: Vec::new(),
            last_task_id: None,
            last_operation: None,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
            clock,
        }
    }

    /// Append a message, truncate history to the bound (dropping from the
    /// front) and slide the expiry deadline forward.
    pub fn append_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        tool_calls: Option<Vec<Value>>,
        tool_results: Option<Vec<Value>>,
    ) {
        let now = self.clock.now();
        self.messages.push(ChatMessage {
            id: Uuid::new_v4(),
            session_id: self.session_id,
            role,
            content: content.into(),
            timestamp: now,
            tool_calls,
            tool_results,
        });

        // Keep only the most recent messages to bound model context size.
        if self.messages.len() > MAX_CONTEXT_MESSAGES {
            let excess = self.messages.len() - MAX_CONTEXT_MESSAGES;
            self.messages.drain(..excess);
        }

        self.updated_at = now;
        self.expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);
    }

    /// Short digest of the referent state for the system prompt.
    pub fn context_summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(task_id) = self.last_task_id {
            parts.push(format!("Last mentioned task ID: {task_id}"));
        }
        if let Some(operation) = self.last_operation {
            parts.push(format!("Last operation: {}", operation.as_str()));
        }

        if parts.is_empty() {
            "No previous context".to_string()
        } else {
            parts.join("\n")
        }
    }

    pub fn is_expired(&self) -> bool {
        self.clock.now() > self.expires_at
    }

    /// Overwrite the referent fields that are present; absent arguments keep
    /// the stored value. A delete therefore updates only `last_operation`,
    /// leaving `last_task_id` pointing at the removed task; only a new
    /// non-null id replaces it.
    pub fn update_referent(&mut self, task_id: Option<i64>, operation: Option<TaskOperation>) {
        if let Some(task_id) = task_id {
            self.last_task_id = Some(task_id);
        }
        if let Some(operation) = operation {
            self.last_operation = Some(operation);
        }
        self.updated_at = self.clock.now();
    }
}
