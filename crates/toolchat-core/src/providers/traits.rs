//! The LLM completion boundary

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::types::{CancellationToken, ChatMessage, CompletionResponse, StreamChunk, ToolChoice, ToolDescriptor};
use super::error::ProviderResult;

/// Which model to ask, and with what credentials
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    /// Model identifier, or the deployment name for Azure
    pub model: String,
    pub api_key: Option<String>,
    /// Overrides the provider's default endpoint
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Sampling parameters and the tools offered for one completion
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Tools the model may call, in registration order
    pub tools: Vec<ToolDescriptor>,
    /// Only meaningful when `tools` is non-empty
    pub tool_choice: Option<ToolChoice>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Offer `tools` with `choice`. An empty list leaves both unset, so the
    /// request carries neither a tools array nor a tool choice.
    pub fn offer_tools(self, tools: Vec<ToolDescriptor>, choice: ToolChoice) -> Self {
        if tools.is_empty() {
            return self;
        }
        self.with_tools(tools).with_tool_choice(choice)
    }

    pub fn tool_list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn offers_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}

/// A completion delivered chunk by chunk
pub type StreamResponse = Pin<Box<dyn Stream<Item = ProviderResult<StreamChunk>> + Send>>;

/// An LLM backend that can answer with text, tool calls, or both
///
/// Implemented by [`GenaiProvider`](super::GenaiProvider),
/// [`OpenAiCompatProvider`](super::OpenAiCompatProvider) and
/// [`MockProvider`](super::MockProvider).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider id from the config (e.g. "openai", "azure")
    fn name(&self) -> &str;

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse>;

    /// Drain the stream into one response. Tool calls keep the order in
    /// which the model emitted them.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<CompletionResponse> {
        let mut stream = self.stream_chat(messages, model, options, cancel_token).await?;
        let mut response = CompletionResponse::default();
        while let Some(chunk) = stream.next().await {
            response.push_chunk(chunk?);
        }
        Ok(response)
    }
}
