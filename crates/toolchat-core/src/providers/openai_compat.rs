//! OpenAI-compatible chat completions over plain HTTP
//!
//! Covers Azure OpenAI deployments (`api-key` header and `api-version`
//! query) and any server exposing `POST {base}/chat/completions`.

use async_trait::async_trait;
use futures::stream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, CompletionResponse, MessageRole, StreamChunk, ToolCallRequest};

use super::error::{ProviderError, ProviderResult};
use super::traits::{CompletionOptions, Provider, ProviderModelConfig, StreamResponse};

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Addressing and auth scheme of the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `{base}/chat/completions` with a bearer token
    OpenAi,
    /// `{base}/openai/deployments/{model}/chat/completions?api-version=...`
    /// with an `api-key` header
    Azure { api_version: String },
}

/// Provider speaking the OpenAI chat completions wire format
pub struct OpenAiCompatProvider {
    provider_id: String,
    flavor: ApiFlavor,
    client: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl OpenAiCompatProvider {
    pub fn new(provider_id: impl Into<String>, flavor: ApiFlavor, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into(),
            flavor,
            client: reqwest::Client::new(),
            logger,
        }
    }

    /// Azure OpenAI with the given api-version (or the default)
    pub fn azure(api_version: Option<String>, logger: Arc<dyn Logger>) -> Self {
        let api_version = api_version.unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
        Self::new("azure", ApiFlavor::Azure { api_version }, logger)
    }

    pub fn flavor(&self) -> &ApiFlavor {
        &self.flavor
    }

    /// Full request URL for a model
    pub fn endpoint(&self, model: &ProviderModelConfig) -> ProviderResult<String> {
        match &self.flavor {
            ApiFlavor::OpenAi => {
                let base = model.api_base.as_deref().unwrap_or(OPENAI_API_BASE);
                Ok(format!("{}/chat/completions", base.trim_end_matches('/')))
            }
            ApiFlavor::Azure { api_version } => {
                let base = model.api_base.as_deref().ok_or_else(ProviderError::azure_endpoint)?;
                Ok(format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    base.trim_end_matches('/'),
                    model.model,
                    api_version
                ))
            }
        }
    }

    fn build_request(&self, messages: Vec<ChatMessage>, model: &ProviderModelConfig, options: &CompletionOptions) -> WireRequest {
        let tools: Vec<WireTool> = options
            .tool_list()
            .iter()
            .map(|t| WireTool {
                kind: "function".to_string(),
                function: WireFunctionDef {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameter_schema.clone(),
                },
            })
            .collect();

        let tool_choice = if tools.is_empty() {
            None
        } else {
            Some(options.tool_choice.unwrap_or_default().as_str().to_string())
        };

        WireRequest {
            model: model.model.clone(),
            messages: messages.into_iter().map(WireMessage::from).collect(),
            tools,
            tool_choice,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    async fn send(
        &self,
        messages: Vec<ChatMessage>,
        model: &ProviderModelConfig,
        options: &CompletionOptions,
    ) -> ProviderResult<CompletionResponse> {
        let url = self.endpoint(model)?;
        let body = self.build_request(messages, model, options);

        let mut request = self.client.post(&url).json(&body);
        request = match (&self.flavor, model.api_key.as_deref()) {
            (ApiFlavor::Azure { .. }, Some(key)) => request.header("api-key", key),
            (ApiFlavor::OpenAi, Some(key)) => request.bearer_auth(key),
            (_, None) => request,
        };

        self.logger.debug(&format!(
            "[OpenAiCompat] POST {} ({} messages, {} tools)",
            url,
            body.messages.len(),
            body.tools.len()
        ));

        let response = request.send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::rate_limited(&self.provider_id, message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::api_error(&self.provider_id, status.as_u16(), message));
        }

        let text = response.text().await?;
        let parsed: WireResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::invalid_response(&self.provider_id, e.to_string()))?;
        parsed.into_completion(&self.provider_id)
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        let response = tokio::select! {
            result = self.send(messages, &model, &options) => result?,
            _ = cancel_token.cancelled() => return Err(ProviderError::Cancelled),
        };

        let chunks: Vec<ProviderResult<StreamChunk>> = response.into_chunks().into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<ChatMessage> for WireMessage {
    fn from(msg: ChatMessage) -> Self {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };
        // assistant messages that only carry tool calls send null content
        let content = if msg.role == MessageRole::Assistant && msg.content.is_empty() && msg.has_tool_calls() {
            None
        } else {
            Some(msg.content)
        };
        Self {
            role,
            content,
            tool_calls: msg.tool_calls.into_iter().map(WireToolCall::from).collect(),
            tool_call_id: msg.tool_call_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<ToolCallRequest> for WireToolCall {
    fn from(call: ToolCallRequest) -> Self {
        Self {
            id: call.id,
            kind: function_kind(),
            function: WireFunctionCall {
                name: call.tool_name,
                arguments: call.raw_arguments,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl WireResponse {
    fn into_completion(self, provider: &str) -> ProviderResult<CompletionResponse> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response(provider, "response has no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|c| ToolCallRequest::new(c.id, c.function.name, c.function.arguments))
            .collect();

        Ok(CompletionResponse::with_tool_calls(
            choice.message.content.unwrap_or_default(),
            tool_calls,
        ))
    }
}
