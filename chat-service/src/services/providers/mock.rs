//! Scripted provider for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ChatOutcome, ChatProvider, ProviderError, ProviderMessage};

/// Replays a scripted queue of outcomes and records every request so tests
/// can assert on the exact messages the agent sent.
#[derive(Default)]
pub struct MockChatProvider {
    outcomes: Mutex<VecDeque<Result<ChatOutcome, ProviderError>>>,
    requests: Mutex<Vec<Vec<ProviderMessage>>>,
}

impl MockChatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(&self, outcome: ChatOutcome) {
        self.outcomes.lock().unwrap().push_back(Ok(outcome));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Shorthand for a plain text reply with no tool calls.
    pub fn push_reply(&self, content: &str) {
        self.push_outcome(ChatOutcome {
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
        });
    }

    /// Messages of every completion request, in call order.
    pub fn recorded_requests(&self) -> Vec<Vec<ProviderMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(
        &self,
        messages: &[ProviderMessage],
        _tools: &[Value],
    ) -> Result<ChatOutcome, ProviderError> {
        self.requests.lock().unwrap().push(messages.to_vec());

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::NotConfigured(
                    "no scripted outcome left".to_string(),
                ))
            })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
