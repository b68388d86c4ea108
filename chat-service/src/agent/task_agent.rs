//! Turn orchestration: context bookkeeping, model calls and tool execution.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::prompts;
use crate::conversation::{ConversationContext, Role, TaskOperation};
use crate::services::providers::{
    ChatProvider, ProviderError, ProviderMessage, ToolCallRequest,
};
use crate::tools::{function_catalog, ToolExecutor, ToolName, ToolResult};

/// Failures inside a turn. All of them collapse into the apology reply; the
/// caller never sees an error.
#[derive(Debug, Error)]
enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Invalid tool payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Orchestrates one conversational turn per call. The provider selects
/// tools; the executor runs them; the context records everything.
pub struct TaskAgent {
    provider: Arc<dyn ChatProvider>,
    executor: ToolExecutor,
}

impl TaskAgent {
    pub fn new(provider: Arc<dyn ChatProvider>, executor: ToolExecutor) -> Self {
        Self { provider, executor }
    }

    /// Process one user message against the session context and return the
    /// reply. The turn always completes: any internal failure becomes an
    /// apology appended to the context instead of an error.
    pub async fn process_message(
        &self,
        context: &mut ConversationContext,
        user_message: &str,
    ) -> String {
        context.append_message(Role::User, user_message, None, None);

        match self.run_turn(context).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(session_id = %context.session_id, error = %err, "Turn failed");
                let apology = format!("I encountered an error: {err}. Please try again.");
                context.append_message(Role::Assistant, apology.clone(), None, None);
                apology
            }
        }
    }

    async fn run_turn(&self, context: &mut ConversationContext) -> Result<String, AgentError> {
        let mut messages =
            vec![ProviderMessage::system(prompts::system_prompt(
                &context.context_summary(),
            ))];
        messages.extend(
            context
                .messages
                .iter()
                .map(|message| {
                    ProviderMessage::plain(message.role.as_str(), message.content.clone())
                }),
        );

        let tools = function_catalog();
        let first = self.provider.complete(&messages, &tools).await?;

        if first.tool_calls.is_empty() {
            let content = first.content.unwrap_or_default();
            context.append_message(Role::Assistant, content.clone(), None, None);
            return Ok(content);
        }

        let results = self.execute_tool_calls(&first.tool_calls).await?;

        // Record the raw tool-call payloads on the assistant turn that
        // requested them.
        let call_records: Vec<Value> = first
            .tool_calls
            .iter()
            .map(ToolCallRequest::to_record)
            .collect();
        context.append_message(
            Role::Assistant,
            first.content.clone().unwrap_or_default(),
            Some(call_records),
            None,
        );

        // Second model call: the assistant turn plus one tool message per
        // invocation, paired by tool-call id.
        messages.push(ProviderMessage::assistant(
            first.content.clone(),
            first.tool_calls.clone(),
        ));
        for (call, result) in first.tool_calls.iter().zip(&results) {
            let payload = serde_json::to_string(result)?;
            messages.push(ProviderMessage::tool(call.id.clone(), payload));
        }

        let second = self.provider.complete(&messages, &[]).await?;
        let final_content = second.content.unwrap_or_default();

        self.update_context_from_results(context, &results);

        let result_records: Vec<Value> = results
            .iter()
            .filter_map(|result| serde_json::to_value(result).ok())
            .collect();
        context.append_message(
            Role::Assistant,
            final_content.clone(),
            None,
            Some(result_records),
        );

        Ok(final_content)
    }

    /// Run the requested tools in order. Results pair positionally with the
    /// requests; execution is sequential so the pairing is deterministic.
    async fn execute_tool_calls(
        &self,
        tool_calls: &[ToolCallRequest],
    ) -> Result<Vec<ToolResult>, AgentError> {
        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            let arguments: Value = serde_json::from_str(&call.arguments)?;
            results.push(self.executor.execute(&call.name, &arguments).await);
        }
        Ok(results)
    }

    /// Referent updates come from successful results only. A delete keeps
    /// the stored task id: only a new id from a later result can replace it.
    fn update_context_from_results(
        &self,
        context: &mut ConversationContext,
        results: &[ToolResult],
    ) {
        for result in results {
            if !result.success {
                continue;
            }

            let Ok(name) = result.tool_name.parse::<ToolName>() else {
                continue;
            };

            let task_id = result
                .result
                .as_ref()
                .and_then(|value| value.get("id"))
                .and_then(Value::as_i64);

            match name {
                ToolName::CreateTask => {
                    if let Some(task_id) = task_id {
                        context.update_referent(Some(task_id), Some(TaskOperation::Create));
                    }
                }
                ToolName::GetTask => {
                    if let Some(task_id) = task_id {
                        context.update_referent(Some(task_id), Some(TaskOperation::View));
                    }
                }
                ToolName::UpdateTask => {
                    if let Some(task_id) = task_id {
                        context.update_referent(Some(task_id), Some(TaskOperation::Update));
                    }
                }
                ToolName::ToggleComplete => {
                    if let Some(task_id) = task_id {
                        context.update_referent(Some(task_id), Some(TaskOperation::Complete));
                    }
                }
                ToolName::DeleteTask => {
                    context.update_referent(None, Some(TaskOperation::Delete));
                }
                ToolName::ListTasks => {}
            }
        }
    }
}
