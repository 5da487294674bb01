//! Streaming response types

use serde::{Deserialize, Serialize};

use super::tool::ToolCallRequest;

/// Streaming chunk from an LLM response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Text content chunk
    Text {
        text: String,
    },
    /// Complete tool call
    ToolCall {
        #[serde(rename = "toolCall")]
        tool_call: ToolCallRequest,
    },
}

impl StreamChunk {
    /// Create a text chunk
    pub fn text(text: impl Into<String>) -> Self {
        StreamChunk::Text { text: text.into() }
    }

    /// Create a tool call chunk
    pub fn tool_call(tool_call: ToolCallRequest) -> Self {
        StreamChunk::ToolCall { tool_call }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamChunk::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A complete, non-streamed LLM response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Text content, possibly empty when tool calls are pending
    pub content: String,
    /// Tool calls in the order the model emitted them
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl CompletionResponse {
    /// A final text answer
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A response requesting tools
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Fold one streamed chunk into the response
    pub fn push_chunk(&mut self, chunk: StreamChunk) {
        match chunk {
            StreamChunk::Text { text } => self.content.push_str(&text),
            StreamChunk::ToolCall { tool_call } => self.tool_calls.push(tool_call),
        }
    }

    /// Split the response back into chunks (text first, then tool calls)
    pub fn into_chunks(self) -> Vec<StreamChunk> {
        let mut chunks = Vec::with_capacity(self.tool_calls.len() + 1);
        if !self.content.is_empty() {
            chunks.push(StreamChunk::text(self.content));
        }
        chunks.extend(self.tool_calls.into_iter().map(StreamChunk::tool_call));
        chunks
    }
}
