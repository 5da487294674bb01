//! Tool provider boundary

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::types::ToolDescriptor;
use super::error::ToolResult;

/// Text-bearing content returned by a provider for one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOutput {
    /// Text items in the order the provider returned them
    pub texts: Vec<String>,
    /// The provider flagged the result as a tool-level failure
    pub is_error: bool,
}

impl ProviderOutput {
    /// A successful single-text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            texts: vec![text.into()],
            is_error: false,
        }
    }

    /// A result the provider marked as an error
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            texts: vec![text.into()],
            is_error: true,
        }
    }
}

/// A live connection to something that hosts tools
///
/// Methods take `&mut self`: a handle serves one request at a time. The
/// multiplexer keeps each handle behind its own async mutex.
#[async_trait]
pub trait ToolProvider: Send {
    /// Descriptors of every tool this provider publishes
    async fn list_tools(&mut self) -> ToolResult<Vec<ToolDescriptor>>;

    /// Invoke one tool
    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> ToolResult<ProviderOutput>;

    /// Release the transport. Called exactly once by the multiplexer.
    async fn close(&mut self) -> ToolResult<()>;
}
