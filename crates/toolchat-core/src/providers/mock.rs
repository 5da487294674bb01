//! Mock provider for testing
//!
//! Provides deterministic, configurable responses without network
//! dependencies. Scripted mode plays back a queue of completions, which is
//! how the conversation loop is driven through tool-call rounds in tests.

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{CompletionOptions, Provider, ProviderModelConfig, StreamResponse};
use crate::logging::Logger;
use crate::types::{
    CancellationToken, ChatMessage, CompletionResponse, MessageRole, StreamChunk, ToolChoice, ToolDescriptor,
};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Answer with this completion
    Reply(CompletionResponse),
    /// Fail the request
    Fail(String),
}

impl From<CompletionResponse> for MockStep {
    fn from(response: CompletionResponse) -> Self {
        MockStep::Reply(response)
    }
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Play back scripted steps in order, one per request
    Script,
    /// Fail every request
    Error(String),
    /// Return nothing (empty response)
    Empty,
}

/// Configuration for the mock provider
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Delay before answering in milliseconds (0 = no delay)
    pub response_delay_ms: u64,
    /// Size of each text chunk when splitting responses
    pub chunk_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Echo,
            response_delay_ms: 0,
            chunk_size: 10,
        }
    }
}

/// A request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDescriptor>,
    pub tool_choice: Option<ToolChoice>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    config: MockConfig,
    script: Mutex<VecDeque<MockStep>>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode,
                ..Default::default()
            },
            logger,
        )
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a provider that fails every request
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Create a provider that returns empty responses
    pub fn empty(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Empty, logger)
    }

    /// Create a provider that plays back `steps` in order
    pub fn scripted<I, S>(steps: I, logger: Arc<dyn Logger>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MockStep>,
    {
        let provider = Self::with_mode(MockMode::Script, logger);
        provider.push_steps(steps);
        provider
    }

    /// Queue more scripted steps
    pub fn push_steps<I, S>(&self, steps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<MockStep>,
    {
        self.script.lock().extend(steps.into_iter().map(Into::into));
    }

    /// Wait before answering each request
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.response_delay_ms = delay_ms;
        self
    }

    /// Set chunk size for splitting responses
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Scripted steps not yet consumed
    pub fn remaining_steps(&self) -> usize {
        self.script.lock().len()
    }

    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }

    /// Split text into chunks
    fn split_into_chunks(&self, text: &str) -> Vec<String> {
        if self.config.chunk_size == 0 || text.is_empty() {
            return vec![text.to_string()];
        }

        text.chars()
            .collect::<Vec<_>>()
            .chunks(self.config.chunk_size)
            .map(|c| c.iter().collect())
            .collect()
    }

    fn next_response(&self, messages: &[ChatMessage]) -> ProviderResult<CompletionResponse> {
        match &self.config.mode {
            MockMode::Echo => Ok(CompletionResponse::text(format!(
                "Echo: {}",
                Self::last_user_message(messages)
            ))),
            MockMode::Fixed(response) => Ok(CompletionResponse::text(response.clone())),
            MockMode::Empty => Ok(CompletionResponse::default()),
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
            MockMode::Script => match self.script.lock().pop_front() {
                Some(MockStep::Reply(response)) => Ok(response),
                Some(MockStep::Fail(message)) => Err(ProviderError::Other(format!("Mock error: {}", message))),
                None => Err(ProviderError::Other("Mock script exhausted".to_string())),
            },
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        self.logger.debug(&format!(
            "[MockProvider] stream_chat called with {} messages",
            messages.len()
        ));

        let response = self.next_response(&messages);
        self.requests.lock().push(RecordedRequest {
            model: model.model,
            tools: options.tool_list().to_vec(),
            tool_choice: options.tool_choice,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            messages,
        });

        if self.config.response_delay_ms > 0 {
            let delay = tokio::time::sleep(Duration::from_millis(self.config.response_delay_ms));
            tokio::select! {
                _ = delay => {}
                _ = cancel_token.cancelled() => return Err(ProviderError::Cancelled),
            }
        }
        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let response = response?;
        let mut chunks: Vec<ProviderResult<StreamChunk>> = Vec::new();
        if !response.content.is_empty() {
            chunks.extend(
                self.split_into_chunks(&response.content)
                    .into_iter()
                    .map(|c| Ok(StreamChunk::text(c))),
            );
        }
        chunks.extend(response.tool_calls.into_iter().map(|c| Ok(StreamChunk::tool_call(c))));

        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::ToolCallRequest;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    fn test_messages(content: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(content)]
    }

    async fn complete(provider: &MockProvider, messages: Vec<ChatMessage>) -> ProviderResult<CompletionResponse> {
        provider
            .complete(
                messages,
                ProviderModelConfig::new("mock-echo"),
                CompletionOptions::default(),
                CancellationToken::new(),
            )
            .await
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let provider = MockProvider::echo(test_logger());
        let response = complete(&provider, test_messages("Hello, world!")).await.unwrap();
        assert_eq!(response.content, "Echo: Hello, world!");
    }

    #[tokio::test]
    async fn test_fixed_mode_is_chunked() {
        let provider = MockProvider::fixed("This is a test response.", test_logger()).with_chunk_size(5);
        let mut stream = provider
            .stream_chat(
                test_messages("Anything"),
                ProviderModelConfig::new("m"),
                CompletionOptions::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let mut pieces = Vec::new();
        while let Some(chunk) = futures::StreamExt::next(&mut stream).await {
            pieces.push(chunk.unwrap().as_text().unwrap_or_default().to_string());
        }
        assert_eq!(pieces.len(), 5);
        assert_eq!(pieces.concat(), "This is a test response.");
    }

    #[tokio::test]
    async fn test_script_plays_in_order() {
        let provider = MockProvider::scripted(
            vec![
                MockStep::Reply(CompletionResponse::with_tool_calls(
                    "",
                    vec![ToolCallRequest::new("call_1", "search", "{}")],
                )),
                MockStep::Reply(CompletionResponse::text("done")),
                MockStep::Fail("upstream down".into()),
            ],
            test_logger(),
        );

        let first = complete(&provider, test_messages("go")).await.unwrap();
        assert_eq!(first.tool_calls[0].id, "call_1");
        assert_eq!(complete(&provider, test_messages("go")).await.unwrap().content, "done");
        assert!(complete(&provider, test_messages("go")).await.is_err());
        assert!(matches!(
            complete(&provider, test_messages("go")).await,
            Err(ProviderError::Other(ref m)) if m.contains("exhausted")
        ));
        assert_eq!(provider.request_count(), 4);
    }

    #[tokio::test]
    async fn test_records_tools_and_options() {
        let provider = MockProvider::empty(test_logger());
        let options = CompletionOptions::new()
            .with_tools(vec![ToolDescriptor::new("search", "")])
            .with_tool_choice(ToolChoice::Auto)
            .with_temperature(0.0)
            .with_max_tokens(2024);
        provider
            .complete(test_messages("hi"), ProviderModelConfig::new("gpt"), options, CancellationToken::new())
            .await
            .unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt");
        assert_eq!(request.tools[0].name, "search");
        assert_eq!(request.tool_choice, Some(ToolChoice::Auto));
        assert_eq!(request.max_tokens, Some(2024));
    }

    #[tokio::test]
    async fn test_error_mode() {
        let provider = MockProvider::error("Test error message", test_logger());
        let err = complete(&provider, test_messages("Anything")).await.unwrap_err();
        assert!(err.to_string().contains("Test error message"));
    }

    #[tokio::test]
    async fn test_cancellation_during_delay() {
        let provider = MockProvider::fixed("slow", test_logger()).with_delay(5_000);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = provider
            .complete(test_messages("x"), ProviderModelConfig::new("m"), CompletionOptions::default(), cancel)
            .await;
        assert!(matches!(result, Err(ProviderError::Cancelled)));
    }

    #[test]
    fn test_chunk_splitting() {
        let provider = MockProvider::echo(test_logger()).with_chunk_size(5);
        assert_eq!(provider.split_into_chunks("Hello, world!"), vec!["Hello", ", wor", "ld!"]);
    }
}
