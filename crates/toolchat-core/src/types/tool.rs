//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool definition sent to the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within one conversation
    pub name: String,
    /// Free text shown to the LLM
    pub description: String,
    /// JSON Schema for the accepted arguments
    #[serde(rename = "inputSchema")]
    pub parameter_schema: Value,
}

impl ToolDescriptor {
    /// Create a descriptor that accepts an empty argument object
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    /// Set the parameter schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameter_schema = schema;
        self
    }
}

/// A tool invocation requested by the LLM
///
/// `raw_arguments` is kept exactly as the provider sent it. It is parsed
/// into a mapping only when the call is executed, so a malformed payload can
/// be reported back to the model instead of failing the response parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned identifier, referenced by the tool result message
    pub id: String,
    /// Name of the tool being called
    pub tool_name: String,
    /// Serialized arguments
    pub raw_arguments: String,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }

    /// Create a request from already structured arguments
    pub fn from_value(id: impl Into<String>, tool_name: impl Into<String>, arguments: &Value) -> Self {
        Self::new(id, tool_name, arguments.to_string())
    }
}

/// Tool choice option for requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    #[default]
    Auto,
    /// Don't use tools
    None,
    /// Force tool use
    Required,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
            ToolChoice::Required => "required",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_creation() {
        let tool = ToolDescriptor::new("search_papers", "Search arXiv").with_schema(json!({
            "type": "object",
            "properties": {
                "topic": { "type": "string" }
            },
            "required": ["topic"]
        }));

        assert_eq!(tool.name, "search_papers");
        assert_eq!(tool.parameter_schema["required"][0], "topic");
    }

    #[test]
    fn test_default_schema_is_empty_object() {
        let tool = ToolDescriptor::new("ping", "Ping");
        assert_eq!(tool.parameter_schema["type"], "object");
    }

    #[test]
    fn test_from_value_serializes_arguments() {
        let call = ToolCallRequest::from_value("call_1", "search_papers", &json!({ "topic": "X" }));
        assert_eq!(call.raw_arguments, r#"{"topic":"X"}"#);
    }

    #[test]
    fn test_tool_choice_wire_names() {
        assert_eq!(ToolChoice::default().as_str(), "auto");
        assert_eq!(serde_json::to_string(&ToolChoice::Required).unwrap(), "\"required\"");
    }
}
