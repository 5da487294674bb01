//! The conversation loop
//!
//! One query runs as a turn: the LLM is asked for a completion, requested
//! tools are executed in emission order and their results fed back, until
//! the LLM answers without tool calls.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ChatConfig, HistoryPolicy, DEFAULT_MAX_ITERATIONS};
use crate::logging::Logger;
use crate::providers::{CompletionOptions, Provider, ProviderError, ProviderModelConfig};
use crate::tools::ToolExecutor;
use crate::types::{CancellationToken, ChatMessage, CompletionResponse, ToolChoice};
use super::error::{ChatError, ChatResult};
use super::state::{ConversationState, TurnState};

/// Per-session loop settings
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Prepended to every request, never stored in the transcript
    pub system_prompt: Option<String>,
    /// LLM requests allowed per turn
    pub max_iterations: usize,
    pub turn_timeout: Option<Duration>,
    pub history: HistoryPolicy,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tool_choice: ToolChoice,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            turn_timeout: None,
            history: HistoryPolicy::Retain,
            temperature: None,
            max_tokens: None,
            tool_choice: ToolChoice::Auto,
        }
    }
}

impl From<&ChatConfig> for OrchestratorOptions {
    fn from(config: &ChatConfig) -> Self {
        Self {
            system_prompt: config.chat.system_prompt.clone(),
            max_iterations: config.chat.max_iterations.max(1),
            turn_timeout: config.chat.turn_timeout_secs.map(Duration::from_secs),
            history: config.chat.history,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            tool_choice: config.llm.tool_choice,
        }
    }
}

impl OrchestratorOptions {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }
}

/// Drives a conversation between the user, the LLM and the tools
pub struct ConversationOrchestrator {
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    executor: Arc<ToolExecutor>,
    options: OrchestratorOptions,
    transcript: ConversationState,
    state: TurnState,
    logger: Arc<dyn Logger>,
}

impl ConversationOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        executor: Arc<ToolExecutor>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            model,
            executor,
            options: OrchestratorOptions::default(),
            transcript: ConversationState::new(),
            state: TurnState::AwaitingUserInput,
            logger,
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn transcript(&self) -> &ConversationState {
        &self.transcript
    }

    /// Forget the transcript
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.state = TurnState::AwaitingUserInput;
    }

    /// Answer one user query
    pub async fn process_query(&mut self, query: &str) -> ChatResult<String> {
        self.process_query_with_cancel(query, CancellationToken::new()).await
    }

    /// Answer one user query; cancelling `cancel` aborts the turn at its
    /// next suspension point
    pub async fn process_query_with_cancel(&mut self, query: &str, cancel: CancellationToken) -> ChatResult<String> {
        if self.options.history == HistoryPolicy::Fresh {
            self.transcript.clear();
        }
        let checkpoint = self.transcript.len();
        let timeout = self.options.turn_timeout;

        self.transcript.push(ChatMessage::user(query));
        self.logger.info(&format!(
            "[Orchestrator] Query received ({} chars, {} messages in transcript)",
            query.len(),
            self.transcript.len()
        ));

        // providers see the turn token, so a timeout also stops their streams
        let turn_cancel = cancel.child_token();
        let outcome = {
            let turn = self.run_turn(&turn_cancel);
            let guarded = async {
                tokio::select! {
                    result = turn => result,
                    _ = turn_cancel.cancelled() => Err(ChatError::Cancelled),
                }
            };
            match timeout {
                Some(limit) => tokio::time::timeout(limit, guarded)
                    .await
                    .unwrap_or(Err(ChatError::Timeout(limit))),
                None => guarded.await,
            }
        };

        match outcome {
            Ok(answer) => {
                self.state = TurnState::FinalResponseReady;
                Ok(answer)
            }
            Err(e) => {
                turn_cancel.cancel();
                self.logger.error(&format!("[Orchestrator] Turn failed: {}", e));
                self.transcript.truncate(checkpoint);
                self.state = TurnState::AwaitingUserInput;
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self, cancel: &CancellationToken) -> ChatResult<String> {
        let max_iterations = self.options.max_iterations;

        for iteration in 1..=max_iterations {
            self.state = TurnState::AwaitingLlmResponse;
            let response = self.request_completion(cancel).await?;

            if !response.has_tool_calls() {
                self.logger.info(&format!(
                    "[Orchestrator] Final answer after {} LLM requests",
                    iteration
                ));
                self.transcript.push(ChatMessage::assistant(response.content.clone()));
                self.state = TurnState::FinalResponseReady;
                return Ok(response.content);
            }

            self.state = TurnState::LlmRequestsTools;
            let names: Vec<&str> = response.tool_calls.iter().map(|c| c.tool_name.as_str()).collect();
            self.logger.info(&format!(
                "[Orchestrator] LLM requested tools: [{}]",
                names.join(", ")
            ));

            let calls = response.tool_calls.clone();
            self.transcript
                .push(ChatMessage::assistant_with_tool_calls(response.content, response.tool_calls));

            self.state = TurnState::ExecutingTools;
            for call in &calls {
                let result = self.executor.execute_call(call).await;
                crate::log_debug!(
                    self.logger,
                    "[Orchestrator] {} ({}) returned {} chars",
                    call.tool_name,
                    call.id,
                    result.len()
                );
                self.transcript.push(ChatMessage::tool_result(&call.id, result));
            }
        }

        Err(ChatError::ConversationAbandoned {
            iterations: max_iterations,
        })
    }

    async fn request_completion(&self, cancel: &CancellationToken) -> ChatResult<CompletionResponse> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        if let Some(prompt) = &self.options.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend_from_slice(self.transcript.messages());

        let options = CompletionOptions {
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            ..CompletionOptions::default()
        }
        .offer_tools(self.executor.registry().list_descriptors(), self.options.tool_choice);

        self.provider
            .complete(messages, self.model.clone(), options, cancel.clone())
            .await
            .map_err(|e| match e {
                ProviderError::Cancelled => ChatError::Cancelled,
                other => ChatError::LlmRequestFailure(other),
            })
    }
}
