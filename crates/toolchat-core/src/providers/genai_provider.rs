//! GenaiProvider - provider backed by the genai crate
//!
//! Handles genai's native providers (OpenAI, Anthropic, Gemini, Ollama, ...)
//! and OpenAI-compatible hosts reachable through a ServiceTargetResolver.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::Arc;

use genai::chat::ChatRequest;

use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, ToolChoice};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_event, is_genai_supported, to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{CompletionOptions, Provider, ProviderModelConfig, StreamResponse};

/// Provider using genai for all supported LLM APIs
pub struct GenaiProvider {
    provider_id: String,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(provider_id: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into(),
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        is_genai_supported(provider_id)
    }

    /// Extract model name from a model string (e.g., "openai/gpt-4" -> "gpt-4")
    pub fn extract_model_name(model: &str) -> &str {
        model.split_once('/').map(|(_, name)| name).unwrap_or(model)
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        self.logger.info(&format!(
            "[GenaiProvider] stream_chat called: provider={}, model={}",
            self.provider_id, model_config.model
        ));

        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let client = create_client(&self.provider_id, &model_config);

        let mut chat_req = ChatRequest::new(to_genai_messages(messages));

        match options.tool_choice {
            Some(ToolChoice::None) => {}
            choice => {
                if choice == Some(ToolChoice::Required) {
                    self.logger
                        .debug("[GenaiProvider] tool_choice=required is sent as auto");
                }
                let tools = options.tool_list();
                if !tools.is_empty() {
                    chat_req = chat_req.with_tools(to_genai_tools(tools));
                }
            }
        }

        let genai_options = to_genai_options(&options);
        let model_name = Self::extract_model_name(&model_config.model);

        let request = client.exec_chat_stream(model_name, chat_req, Some(&genai_options));
        let chat_stream = tokio::select! {
            result = request => result.map_err(|e| ProviderError::request(&self.provider_id, e.to_string()))?,
            _ = cancel_token.cancelled() => return Err(ProviderError::Cancelled),
        };

        self.logger.debug("[GenaiProvider] Stream started");

        let logger = Arc::clone(&self.logger);
        let provider_id = self.provider_id.clone();

        let stream = chat_stream.stream.flat_map(move |result| {
            let items: Vec<ProviderResult<_>> = if cancel_token.is_cancelled() {
                logger.info("[GenaiProvider] Stream cancelled");
                vec![Err(ProviderError::Cancelled)]
            } else {
                match result {
                    Ok(event) => from_genai_event(event).into_iter().map(Ok).collect(),
                    Err(e) => {
                        logger.error(&format!("[GenaiProvider] Stream error: {}", e));
                        vec![Err(ProviderError::stream(&provider_id, e.to_string()))]
                    }
                }
            };
            stream::iter(items)
        });

        Ok(Box::pin(stream))
    }
}
