//! Conversation state

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, MessageRole};

/// Where the orchestrator is within a turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    AwaitingUserInput,
    AwaitingLlmResponse,
    LlmRequestsTools,
    ExecutingTools,
    FinalResponseReady,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnState::AwaitingUserInput => "awaiting_user_input",
            TurnState::AwaitingLlmResponse => "awaiting_llm_response",
            TurnState::LlmRequestsTools => "llm_requests_tools",
            TurnState::ExecutingTools => "executing_tools",
            TurnState::FinalResponseReady => "final_response_ready",
        };
        f.write_str(name)
    }
}

/// Ordered transcript of one session
///
/// Messages are only ever appended. The orchestrator may drop a suffix to
/// undo a failed turn, or clear everything under the fresh history policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drop everything after the first `len` messages
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }

    /// Tool call ids with no answering tool message
    ///
    /// Empty for every transcript the orchestrator leaves behind.
    pub fn unanswered_tool_calls(&self) -> Vec<&str> {
        let answered: std::collections::HashSet<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        self.messages
            .iter()
            .flat_map(|m| m.tool_calls.iter())
            .map(|c| c.id.as_str())
            .filter(|id| !answered.contains(id))
            .collect()
    }
}
