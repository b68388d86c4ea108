//! Agent turn-orchestration tests: scripted model outcomes against the
//! in-memory task backend.

mod common;

use std::sync::Arc;

use chat_service::agent::TaskAgent;
use chat_service::config::BackendSettings;
use chat_service::conversation::{ConversationContext, ManualClock, Role, TaskOperation};
use chat_service::services::providers::mock::MockChatProvider;
use chat_service::services::providers::{ChatOutcome, ProviderError, ToolCallRequest};
use chat_service::services::BackendClient;
use chat_service::tools::ToolExecutor;
use chrono::Utc;
use serde_json::{json, Value};

fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn agent_with(provider: Arc<MockChatProvider>, base_url: &str) -> TaskAgent {
    let settings = BackendSettings {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    };
    TaskAgent::new(
        provider,
        ToolExecutor::new(BackendClient::new(&settings, common::TEST_TOKEN)),
    )
}

fn new_context() -> ConversationContext {
    ConversationContext::new(None, Arc::new(ManualClock::new(Utc::now())))
}

#[tokio::test]
async fn create_flow_updates_referent_and_records_history() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());
    provider.push_outcome(ChatOutcome {
        content: None,
        tool_calls: vec![tool_call(
            "call_1",
            "create_task",
            json!({ "title": "buy milk" }),
        )],
    });
    provider.push_reply("I've added 'buy milk' to your list. It's task #1.");

    let agent = agent_with(provider.clone(), &backend.base_url);
    let mut context = new_context();

    let reply = agent
        .process_message(&mut context, "Add a task to buy milk")
        .await;

    assert!(reply.contains("task #1"));
    assert_eq!(context.last_task_id, Some(1));
    assert_eq!(context.last_operation, Some(TaskOperation::Create));

    // user turn, assistant tool-call turn, final assistant turn
    assert_eq!(context.messages.len(), 3);
    assert_eq!(context.messages[0].role, Role::User);
    assert!(context.messages[1].tool_calls.is_some());
    assert!(context.messages[2].tool_results.is_some());

    // The second model call carried the tool result, paired by call id.
    let requests = provider.recorded_requests();
    assert_eq!(requests.len(), 2);
    let tool_message = requests[1]
        .iter()
        .find(|message| message.role == "tool")
        .expect("tool message in second request");
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_message
        .content
        .as_deref()
        .unwrap()
        .contains("\"success\":true"));
}

#[tokio::test]
async fn empty_list_flow_leaves_referent_unchanged() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());
    provider.push_outcome(ChatOutcome {
        content: None,
        tool_calls: vec![tool_call("call_1", "list_tasks", json!({}))],
    });
    provider.push_reply("You have no tasks. Would you like to add one?");

    let agent = agent_with(provider.clone(), &backend.base_url);
    let mut context = new_context();

    let reply = agent.process_message(&mut context, "Show me my tasks").await;

    assert!(reply.contains("no tasks"));
    assert_eq!(context.last_task_id, None);
    assert_eq!(context.last_operation, None);

    let requests = provider.recorded_requests();
    let tool_message = requests[1]
        .iter()
        .find(|message| message.role == "tool")
        .unwrap();
    assert!(tool_message
        .content
        .as_deref()
        .unwrap()
        .contains("\"total\":0"));
}

#[tokio::test]
async fn referent_appears_in_the_system_prompt() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());
    provider.push_reply("That was task 7.");

    let agent = agent_with(provider.clone(), &backend.base_url);
    let mut context = new_context();
    context.update_referent(Some(7), Some(TaskOperation::Create));

    agent
        .process_message(&mut context, "What was that task?")
        .await;

    let requests = provider.recorded_requests();
    let system = &requests[0][0];
    assert_eq!(system.role, "system");
    assert!(system
        .content
        .as_deref()
        .unwrap()
        .contains("Last mentioned task ID: 7"));
}

#[tokio::test]
async fn delete_keeps_the_referent_task_id() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());

    // Turn one: create task 1.
    provider.push_outcome(ChatOutcome {
        content: None,
        tool_calls: vec![tool_call(
            "call_1",
            "create_task",
            json!({ "title": "old" }),
        )],
    });
    provider.push_reply("Created task #1.");

    // Turn two: delete it.
    provider.push_outcome(ChatOutcome {
        content: None,
        tool_calls: vec![tool_call("call_2", "delete_task", json!({ "task_id": 1 }))],
    });
    provider.push_reply("Done, task #1 is gone.");

    let agent = agent_with(provider.clone(), &backend.base_url);
    let mut context = new_context();

    agent.process_message(&mut context, "Add a task: old").await;
    agent.process_message(&mut context, "Delete it").await;

    assert_eq!(context.last_task_id, Some(1));
    assert_eq!(context.last_operation, Some(TaskOperation::Delete));

    // The second turn's instruction text carried the referent from the
    // first, so "it" was resolvable.
    let requests = provider.recorded_requests();
    let second_turn_system = &requests[2][0];
    assert_eq!(second_turn_system.role, "system");
    assert!(second_turn_system
        .content
        .as_deref()
        .unwrap()
        .contains("Last mentioned task ID: 1"));
}

#[tokio::test]
async fn failed_tool_results_do_not_touch_the_referent() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());
    provider.push_outcome(ChatOutcome {
        content: None,
        tool_calls: vec![tool_call("call_1", "get_task", json!({ "task_id": 999 }))],
    });
    provider.push_reply("I couldn't find task 999.");

    let agent = agent_with(provider.clone(), &backend.base_url);
    let mut context = new_context();

    let reply = agent
        .process_message(&mut context, "Show me task 999")
        .await;

    assert!(reply.contains("999"));
    assert_eq!(context.last_task_id, None);
    assert_eq!(context.last_operation, None);
}

#[tokio::test]
async fn provider_failure_becomes_an_apology() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());
    provider.push_error(ProviderError::ApiError("model unavailable".to_string()));

    let agent = agent_with(provider, &backend.base_url);
    let mut context = new_context();

    let reply = agent.process_message(&mut context, "Hello").await;

    assert!(reply.starts_with("I encountered an error:"));
    assert!(reply.ends_with("Please try again."));

    // The apology is recorded as an assistant turn.
    let last = context.messages.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, reply);
}

#[tokio::test]
async fn malformed_tool_arguments_become_an_apology() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());
    provider.push_outcome(ChatOutcome {
        content: None,
        tool_calls: vec![ToolCallRequest {
            id: "call_1".to_string(),
            name: "create_task".to_string(),
            arguments: "not json".to_string(),
        }],
    });

    let agent = agent_with(provider, &backend.base_url);
    let mut context = new_context();

    let reply = agent.process_message(&mut context, "Add something").await;

    assert!(reply.starts_with("I encountered an error:"));
}

#[tokio::test]
async fn multiple_tool_calls_run_in_request_order() {
    let backend = common::spawn_backend().await;
    let provider = Arc::new(MockChatProvider::new());
    provider.push_outcome(ChatOutcome {
        content: None,
        tool_calls: vec![
            tool_call("call_1", "create_task", json!({ "title": "first" })),
            tool_call("call_2", "create_task", json!({ "title": "second" })),
        ],
    });
    provider.push_reply("Added both tasks.");

    let agent = agent_with(provider.clone(), &backend.base_url);
    let mut context = new_context();

    agent
        .process_message(&mut context, "Add two tasks: first and second")
        .await;

    // Sequential execution means ids 1 and 2 in request order; the referent
    // points at the last successful result.
    assert_eq!(context.last_task_id, Some(2));
    assert_eq!(context.last_operation, Some(TaskOperation::Create));

    let requests = provider.recorded_requests();
    let tool_ids: Vec<_> = requests[1]
        .iter()
        .filter(|message| message.role == "tool")
        .map(|message| message.tool_call_id.clone().unwrap())
        .collect();
    assert_eq!(tool_ids, ["call_1", "call_2"]);
}
