//! Tool call execution
//!
//! [`ToolExecutor::execute`] never fails: every problem with a single call
//! is rendered into the result text so the LLM can react to it.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::logging::Logger;
use crate::types::ToolCallRequest;
use super::error::{ToolError, ToolResult};
use super::local::call_guarded;
use super::multiplexer::ToolProviderMultiplexer;
use super::normalize::normalize_value;
use super::registry::{ToolHandler, ToolRegistry};

/// Runs tool calls against the registry
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    multiplexer: Arc<ToolProviderMultiplexer>,
    logger: Arc<dyn Logger>,
}

impl ToolExecutor {
    pub fn new(
        registry: Arc<ToolRegistry>,
        multiplexer: Arc<ToolProviderMultiplexer>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            registry,
            multiplexer,
            logger,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute a call requested by the LLM
    pub async fn execute_call(&self, call: &ToolCallRequest) -> String {
        match parse_arguments(call) {
            Ok(arguments) => self.execute(&call.tool_name, arguments).await,
            Err(e) => {
                self.logger.warn(&format!("[ToolExecutor] {}", e));
                e.to_tool_result_text()
            }
        }
    }

    /// Execute a tool by name, returning the result text
    pub async fn execute(&self, tool_name: &str, arguments: Map<String, Value>) -> String {
        match self.try_execute(tool_name, arguments).await {
            Ok(text) => text,
            Err(e) => {
                self.logger.warn(&format!("[ToolExecutor] {}", e));
                e.to_tool_result_text()
            }
        }
    }

    /// Execute a tool by name, keeping the error typed
    pub async fn try_execute(&self, tool_name: &str, arguments: Map<String, Value>) -> ToolResult<String> {
        let handler = self.registry.resolve(tool_name)?;
        self.logger.info(&format!(
            "[ToolExecutor] Calling tool: {} ({})",
            tool_name,
            handler.owner()
        ));

        match handler {
            ToolHandler::Local(tool) => {
                let value = call_guarded(tool.as_ref(), tool_name, arguments).await?;
                Ok(normalize_value(&value))
            }
            ToolHandler::Provider(_) => self.multiplexer.dispatch(tool_name, arguments).await,
        }
    }
}

/// Parse the raw argument payload of a call into named arguments
///
/// Blank payloads mean "no arguments". Anything else must be a JSON object.
pub fn parse_arguments(call: &ToolCallRequest) -> ToolResult<Map<String, Value>> {
    let raw = call.raw_arguments.trim();
    if raw.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(ToolError::malformed_arguments(
            &call.tool_name,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(e) => Err(ToolError::malformed_arguments(&call.tool_name, e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
