//! Static catalog of the task tools exposed to the model.
//!
//! The catalog is fixed: six operations, loaded once, never mutated. No
//! dynamic registration.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde_json::{json, Value};
use thiserror::Error;

/// Closed set of operations the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateTask,
    ListTasks,
    GetTask,
    UpdateTask,
    DeleteTask,
    ToggleComplete,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateTask => "create_task",
            ToolName::ListTasks => "list_tasks",
            ToolName::GetTask => "get_task",
            ToolName::UpdateTask => "update_task",
            ToolName::DeleteTask => "delete_task",
            ToolName::ToggleComplete => "toggle_complete",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolName {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_task" => Ok(ToolName::CreateTask),
            "list_tasks" => Ok(ToolName::ListTasks),
            "get_task" => Ok(ToolName::GetTask),
            "update_task" => Ok(ToolName::UpdateTask),
            "delete_task" => Ok(ToolName::DeleteTask),
            "toggle_complete" => Ok(ToolName::ToggleComplete),
            other => Err(UnknownTool(other.to_string())),
        }
    }
}

/// A tool definition: name, model-facing description and parameter schema.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: ToolName,
    pub description: &'static str,
    /// Parameter name to `{type, description}` schema.
    pub parameters: Value,
    pub required: &'static [&'static str],
}

impl ToolDefinition {
    /// Wrap the definition in the function-calling envelope. Parameters not
    /// listed in `required` are implicitly optional.
    pub fn to_function(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name.as_str(),
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": self.parameters,
                    "required": self.required,
                }
            }
        })
    }
}

static TOOLS: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    vec![
        ToolDefinition {
            name: ToolName::CreateTask,
            description: "Create a new task with a title and optional description. Use this when the user wants to add a new item to their todo list.",
            parameters: json!({
                "title": {
                    "type": "string",
                    "description": "The task title (1-200 characters). This is what the user wants to do."
                },
                "description": {
                    "type": "string",
                    "description": "Optional additional details about the task (0-1000 characters)."
                }
            }),
            required: &["title"],
        },
        ToolDefinition {
            name: ToolName::ListTasks,
            description: "Get a list of the user's tasks. Can filter by completion status. Use this when the user wants to see their todo list.",
            parameters: json!({
                "completed": {
                    "type": "boolean",
                    "description": "Filter by completion status. true = only completed, false = only incomplete, omit = all tasks"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of tasks to return (default 100)"
                }
            }),
            required: &[],
        },
        ToolDefinition {
            name: ToolName::GetTask,
            description: "Get details of a specific task by its ID. Use this when the user asks about a particular task.",
            parameters: json!({
                "task_id": {
                    "type": "integer",
                    "description": "The ID of the task to retrieve"
                }
            }),
            required: &["task_id"],
        },
        ToolDefinition {
            name: ToolName::UpdateTask,
            description: "Update a task's title, description, or completion status. Use this when the user wants to modify an existing task.",
            parameters: json!({
                "task_id": {
                    "type": "integer",
                    "description": "The ID of the task to update"
                },
                "title": {
                    "type": "string",
                    "description": "New task title (1-200 characters). Only provide if changing the title."
                },
                "description": {
                    "type": "string",
                    "description": "New task description. Only provide if changing the description."
                },
                "completed": {
                    "type": "boolean",
                    "description": "New completion status. Only provide if changing the status."
                }
            }),
            required: &["task_id"],
        },
        ToolDefinition {
            name: ToolName::DeleteTask,
            description: "Permanently delete a task. Use this when the user wants to remove a task. ALWAYS confirm with the user before calling this.",
            parameters: json!({
                "task_id": {
                    "type": "integer",
                    "description": "The ID of the task to delete"
                }
            }),
            required: &["task_id"],
        },
        ToolDefinition {
            name: ToolName::ToggleComplete,
            description: "Toggle a task's completion status. If incomplete, mark complete. If complete, mark incomplete. Use when user wants to mark a task as done.",
            parameters: json!({
                "task_id": {
                    "type": "integer",
                    "description": "The ID of the task to toggle"
                }
            }),
            required: &["task_id"],
        },
    ]
});

/// Every tool the agent may dispatch.
pub fn tool_catalog() -> &'static [ToolDefinition] {
    &TOOLS
}

/// The catalog in function-calling envelope form, for the model API.
pub fn function_catalog() -> Vec<Value> {
    TOOLS.iter().map(ToolDefinition::to_function).collect()
}
