//! Adapter between toolchat types and genai types
//!
//! Conversion functions between our messages, tools and stream events and
//! genai's, so genai's streaming and provider implementations can be used
//! behind the [`Provider`](super::Provider) trait.
//!
//! Auth uses the key resolved from our secret store, not genai's own env
//! var lookup.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatStreamEvent, ContentPart,
    MessageContent as GenaiContent, Tool as GenaiTool, ToolCall as GenaiToolCall,
    ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::{json, Value};

use crate::types::{ChatMessage, MessageRole, StreamChunk, ToolCallRequest, ToolDescriptor};

use super::traits::{CompletionOptions, ProviderModelConfig};

// ============================================================================
// Message Conversion: toolchat -> genai
// ============================================================================

/// Convert one transcript message
///
/// An assistant message with tool calls keeps its text as the first part,
/// followed by the calls in emission order.
pub fn to_genai_message(msg: ChatMessage) -> GenaiMessage {
    match msg.role {
        MessageRole::System => GenaiMessage::system(msg.content),
        MessageRole::User => GenaiMessage::user(msg.content),
        MessageRole::Assistant if msg.has_tool_calls() => {
            let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
            if !msg.content.is_empty() {
                parts.push(ContentPart::Text(msg.content));
            }
            parts.extend(msg.tool_calls.iter().map(|call| ContentPart::ToolCall(to_genai_tool_call(call))));
            GenaiMessage::assistant(GenaiContent::from_parts(parts))
        }
        MessageRole::Assistant => GenaiMessage::assistant(msg.content),
        MessageRole::Tool => GenaiMessage::from(GenaiToolResponse::new(
            msg.tool_call_id.unwrap_or_default(),
            msg.content,
        )),
    }
}

/// Convert a vector of messages
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> Vec<GenaiMessage> {
    messages.into_iter().map(to_genai_message).collect()
}

/// Convert a tool call we previously received back into genai's form
///
/// Arguments the model sent as invalid JSON are passed through as a string
/// so the transcript still replays.
pub fn to_genai_tool_call(call: &ToolCallRequest) -> GenaiToolCall {
    let fn_arguments = if call.raw_arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&call.raw_arguments).unwrap_or_else(|_| Value::String(call.raw_arguments.clone()))
    };

    GenaiToolCall {
        call_id: call.id.clone(),
        fn_name: call.tool_name.clone(),
        fn_arguments,
        thought_signatures: None,
    }
}

// ============================================================================
// Tool Conversion: toolchat -> genai
// ============================================================================

pub fn to_genai_tool(tool: &ToolDescriptor) -> GenaiTool {
    GenaiTool::new(&tool.name)
        .with_description(&tool.description)
        .with_schema(tool.parameter_schema.clone())
}

pub fn to_genai_tools(tools: &[ToolDescriptor]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: toolchat -> genai
// ============================================================================

pub fn to_genai_options(options: &CompletionOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // Capture tool calls in the stream so the End event carries them
    genai_opts.with_capture_tool_calls(true)
}

// ============================================================================
// Response Conversion: genai -> toolchat
// ============================================================================

pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCallRequest {
    ToolCallRequest::from_value(tc.call_id.clone(), tc.fn_name.clone(), &tc.fn_arguments)
}

/// Convert a genai stream event
///
/// Text chunks pass through. Tool calls are taken from the captured calls on
/// the End event, all of them, in emission order. Partial tool-call chunks
/// and reasoning events are dropped.
pub fn from_genai_event(event: ChatStreamEvent) -> Vec<StreamChunk> {
    match event {
        ChatStreamEvent::Chunk(chunk) if !chunk.content.is_empty() => vec![StreamChunk::text(chunk.content)],
        ChatStreamEvent::End(end) => end
            .captured_tool_calls()
            .map(|calls| {
                calls
                    .iter()
                    .map(|tc| StreamChunk::tool_call(from_genai_tool_call(tc)))
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Providers genai serves natively
pub fn is_genai_native(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "openai"
            | "anthropic"
            | "gemini"
            | "ollama"
            | "groq"
            | "xai"
            | "deepseek"
            | "cohere"
            | "fireworks"
            | "together"
    )
}

/// Providers genai can serve, natively or through an OpenAI-compatible endpoint
pub fn is_genai_supported(provider: &str) -> bool {
    is_genai_native(provider) || matches!(provider.to_lowercase().as_str(), "openrouter" | "mistral")
}

/// Create a genai Client with our key and endpoint resolution
pub fn create_client(provider: &str, config: &ProviderModelConfig) -> Client {
    let api_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let key = api_key.clone();
            // None lets genai fall back to its defaults, fine for keyless providers like Ollama
            Box::pin(async move { Ok(key.map(AuthData::from_single)) })
        },
    );

    let target_provider = provider.to_lowercase();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let (endpoint, adapter_kind) = match (target_provider.as_str(), target_api_base.as_ref()) {
                (_, Some(base)) if is_genai_native(&target_provider) => {
                    (Endpoint::from_owned(base.clone()), target.model.adapter_kind)
                }
                (_, Some(base)) => (Endpoint::from_owned(base.clone()), AdapterKind::OpenAI),
                ("openrouter", None) => (
                    Endpoint::from_static("https://openrouter.ai/api/v1/"),
                    AdapterKind::OpenAI,
                ),
                ("mistral", None) => (
                    Endpoint::from_static("https://api.mistral.ai/v1/"),
                    AdapterKind::OpenAI,
                ),
                // Native genai providers resolve normally
                _ => return Ok(target),
            };

            let model = ModelIden::new(adapter_kind, target.model.model_name.clone());
            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}
