//! Tool execution: routes named tool requests to backend REST calls and
//! wraps every outcome in a uniform result envelope.

use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::registry::ToolName;
use crate::services::backend::{BackendClient, BackendError};

/// Uniform envelope returned by every tool invocation, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
    /// Wall-clock seconds measured around the dispatch.
    pub execution_time: f64,
}

impl ToolResult {
    fn ok(tool_name: &str, result: Value, execution_time: f64) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            success: true,
            result: Some(result),
            error: None,
            execution_time,
        }
    }

    fn failed(tool_name: &str, error: String, execution_time: f64) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            success: false,
            result: None,
            error: Some(error),
            execution_time,
        }
    }
}

/// Failure modes inside a dispatch. None of them escape the envelope.
#[derive(Debug, Error)]
enum ExecError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ExecError {
    /// User-facing error string for the result envelope.
    fn user_message(&self) -> String {
        match self {
            ExecError::Backend(BackendError::Authentication) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ExecError::Backend(BackendError::NotFound) => {
                "Task not found. It may have been deleted.".to_string()
            }
            ExecError::Backend(err @ BackendError::Api { .. }) => err.to_string(),
            ExecError::Backend(BackendError::Network(message)) => {
                format!("Unexpected error: {message}")
            }
            ExecError::UnknownTool(_) | ExecError::InvalidArguments(_) => {
                format!("Unexpected error: {self}")
            }
        }
    }
}

/// Maps tool invocations onto backend REST calls.
pub struct ToolExecutor {
    backend: BackendClient,
}

impl ToolExecutor {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Run a named tool with the given arguments. Never fails past the
    /// envelope: every outcome, including an unknown name, comes back as a
    /// `ToolResult` with the elapsed duration filled in.
    pub async fn execute(&self, tool_name: &str, arguments: &Value) -> ToolResult {
        let started = Instant::now();

        let outcome = match tool_name.parse::<ToolName>() {
            Ok(name) => self.dispatch(name, arguments).await,
            Err(err) => Err(ExecError::UnknownTool(err.0)),
        };

        let execution_time = started.elapsed().as_secs_f64();
        match outcome {
            Ok(result) => ToolResult::ok(tool_name, result, execution_time),
            Err(err) => {
                tracing::warn!(tool = tool_name, error = %err, "Tool execution failed");
                ToolResult::failed(tool_name, err.user_message(), execution_time)
            }
        }
    }

    async fn dispatch(&self, name: ToolName, arguments: &Value) -> Result<Value, ExecError> {
        match name {
            ToolName::CreateTask => self.create_task(arguments).await,
            ToolName::ListTasks => self.list_tasks(arguments).await,
            ToolName::GetTask => self.get_task(arguments).await,
            ToolName::UpdateTask => self.update_task(arguments).await,
            ToolName::DeleteTask => self.delete_task(arguments).await,
            ToolName::ToggleComplete => self.toggle_complete(arguments).await,
        }
    }

    async fn create_task(&self, arguments: &Value) -> Result<Value, ExecError> {
        let title = require_str(arguments, "title")?;
        let description = optional_str(arguments, "description")?.unwrap_or_default();

        Ok(self
            .backend
            .post(
                "/api/tasks",
                &json!({ "title": title, "description": description }),
            )
            .await?)
    }

    async fn list_tasks(&self, arguments: &Value) -> Result<Value, ExecError> {
        let limit = optional_i64(arguments, "limit")?.unwrap_or(100);
        let offset = optional_i64(arguments, "offset")?.unwrap_or(0);

        let mut query = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        if let Some(completed) = optional_bool(arguments, "completed")? {
            query.push(("completed".to_string(), completed.to_string()));
        }

        Ok(self.backend.get("/api/tasks", &query).await?)
    }

    async fn get_task(&self, arguments: &Value) -> Result<Value, ExecError> {
        let task_id = require_i64(arguments, "task_id")?;
        Ok(self.backend.get(&format!("/api/tasks/{task_id}"), &[]).await?)
    }

    async fn update_task(&self, arguments: &Value) -> Result<Value, ExecError> {
        let task_id = require_i64(arguments, "task_id")?;

        // Only the provided fields go into the patch body.
        let mut fields = Map::new();
        if let Some(title) = optional_str(arguments, "title")? {
            fields.insert("title".to_string(), Value::from(title));
        }
        if let Some(description) = optional_str(arguments, "description")? {
            fields.insert("description".to_string(), Value::from(description));
        }
        if let Some(completed) = optional_bool(arguments, "completed")? {
            fields.insert("completed".to_string(), Value::from(completed));
        }

        Ok(self
            .backend
            .patch(&format!("/api/tasks/{task_id}"), Some(&Value::Object(fields)))
            .await?)
    }

    async fn delete_task(&self, arguments: &Value) -> Result<Value, ExecError> {
        let task_id = require_i64(arguments, "task_id")?;
        self.backend.delete(&format!("/api/tasks/{task_id}")).await?;

        // DELETE has no response body; synthesize one for the envelope.
        Ok(json!({
            "success": true,
            "message": format!("Task {task_id} deleted")
        }))
    }

    async fn toggle_complete(&self, arguments: &Value) -> Result<Value, ExecError> {
        let task_id = require_i64(arguments, "task_id")?;
        Ok(self
            .backend
            .patch(&format!("/api/tasks/{task_id}/complete"), None)
            .await?)
    }
}

fn require_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ExecError> {
    optional_str(arguments, key)?.ok_or_else(|| {
        ExecError::InvalidArguments(format!("missing required argument '{key}'"))
    })
}

fn optional_str<'a>(arguments: &'a Value, key: &str) -> Result<Option<&'a str>, ExecError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(ExecError::InvalidArguments(format!(
            "argument '{key}' must be a string, got {other}"
        ))),
    }
}

fn require_i64(arguments: &Value, key: &str) -> Result<i64, ExecError> {
    optional_i64(arguments, key)?.ok_or_else(|| {
        ExecError::InvalidArguments(format!("missing required argument '{key}'"))
    })
}

fn optional_i64(arguments: &Value, key: &str) -> Result<Option<i64>, ExecError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            ExecError::InvalidArguments(format!(
                "argument '{key}' must be an integer, got {value}"
            ))
        }),
    }
}

fn optional_bool(arguments: &Value, key: &str) -> Result<Option<bool>, ExecError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(ExecError::InvalidArguments(format!(
            "argument '{key}' must be a boolean, got {other}"
        ))),
    }
}
