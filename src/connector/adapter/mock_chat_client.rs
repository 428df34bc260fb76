use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::application::ChatClient;
use crate::domain::{ChatCompletion, ChatRequest, DomainError, PromptRole};

/// Offline [`ChatClient`] that replays scripted results and records every
/// request it receives.
///
/// Once the script runs out it answers with a canned farmer reply built from
/// the question, which is what `--mock` uses.
pub struct MockChatClient {
    script: Mutex<VecDeque<Result<String, DomainError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(script: Vec<Result<String, DomainError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn canned_reply(request: &ChatRequest) -> String {
        let question = request
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == PromptRole::User)
            .map(|m| m.content.trim_start_matches("I have a question about farming.").trim())
            .unwrap_or_default();

        if question.is_empty() {
            "Happy to help! Ask me anything about soil, crops, or livestock.".to_string()
        } else {
            format!(
                "Good question about \"{question}\". Start small, watch your soil, \
                 and keep notes through the season."
            )
        }
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, DomainError> {
        self.requests
            .lock()
            .map_err(|e| DomainError::internal(format!("Failed to lock request log: {}", e)))?
            .push(request.clone());

        let next = self
            .script
            .lock()
            .map_err(|e| DomainError::internal(format!("Failed to lock script: {}", e)))?
            .pop_front();

        let reply = match next {
            Some(result) => result?,
            None => Self::canned_reply(request),
        };
        debug!("MockChatClient reply: {}", reply);

        let raw = json!({
            "object": "chat.completion",
            "model": self.model_name(),
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": reply },
                "finish_reason": "stop"
            }]
        });

        Ok(ChatCompletion::new(reply, raw))
    }

    fn model_name(&self) -> &str {
        "mock-farmer"
    }
}
