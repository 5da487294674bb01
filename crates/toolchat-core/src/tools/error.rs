//! Tool layer errors

use std::any::Any;

use thiserror::Error;

/// Errors raised while registering, routing or executing tools
///
/// Errors from inside a single call (`UnknownTool`, `MalformedToolArguments`,
/// `ToolExecutionFailure`) are rendered into the tool result text by the
/// executor. They never reach the caller of the conversation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("duplicate tool name '{name}': already registered by {existing_owner}, rejected from {new_owner}")]
    DuplicateToolName {
        name: String,
        existing_owner: String,
        new_owner: String,
    },

    #[error("malformed arguments for tool '{tool}': {reason}")]
    MalformedToolArguments { tool: String, reason: String },

    #[error("tool '{tool}' failed: {reason}")]
    ToolExecutionFailure { tool: String, reason: String },

    #[error("failed to connect to provider '{provider}': {reason}")]
    ProviderConnectionFailure { provider: String, reason: String },

    #[error("invalid parameter schema for tool '{tool}': {reason}")]
    InvalidSchema { tool: String, reason: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("provider '{0}' is closed")]
    ProviderClosed(String),
}

impl ToolError {
    pub fn execution_failure(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolExecutionFailure {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedToolArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn connection_failure(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderConnectionFailure {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_schema(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Execution failure carrying the message of a caught panic
    pub fn panicked(tool: impl Into<String>, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::execution_failure(tool, format!("panicked: {}", message))
    }

    /// Text shown to the LLM in place of a tool result
    pub fn to_tool_result_text(&self) -> String {
        format!("Error: {}", self)
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
