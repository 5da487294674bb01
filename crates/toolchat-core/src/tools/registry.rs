//! Tool registry for LLM tool calling
//!
//! The ToolRegistry is the single source of truth for:
//! - Which tools exist and what the LLM is told about them
//! - Which handler (local tool or provider) owns each name
//!
//! Names are unique. The first registration of a name wins and later
//! attempts fail with [`ToolError::DuplicateToolName`].

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::logging::Logger;
use crate::types::ToolDescriptor;
use super::error::{ToolError, ToolResult};
use super::local::LocalTool;

/// Owner label used for tools registered directly in process
pub const LOCAL_OWNER: &str = "local";

/// Route for a registered tool
#[derive(Clone)]
pub enum ToolHandler {
    /// In-process tool
    Local(Arc<dyn LocalTool>),
    /// Tool hosted by the named provider
    Provider(String),
}

impl ToolHandler {
    /// Owner label used in logs and duplicate reports
    pub fn owner(&self) -> &str {
        match self {
            ToolHandler::Local(_) => LOCAL_OWNER,
            ToolHandler::Provider(name) => name,
        }
    }
}

impl std::fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolHandler::Local(_) => write!(f, "Local"),
            ToolHandler::Provider(name) => write!(f, "Provider({})", name),
        }
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

/// Registry of available tools, in registration order
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, RegisteredTool>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(IndexMap::new()),
            logger,
        }
    }

    /// Register a tool under its descriptor name
    ///
    /// The parameter schema is checked here so a bad descriptor is rejected
    /// before it can be advertised to the LLM.
    pub fn register(&self, descriptor: ToolDescriptor, handler: ToolHandler) -> ToolResult<()> {
        validate_schema(&descriptor.name, &descriptor.parameter_schema)?;

        let mut tools = self.tools.write();
        if let Some(existing) = tools.get(&descriptor.name) {
            return Err(ToolError::DuplicateToolName {
                name: descriptor.name.clone(),
                existing_owner: existing.handler.owner().to_string(),
                new_owner: handler.owner().to_string(),
            });
        }

        self.logger.debug(&format!(
            "[ToolRegistry] Registered '{}' from {}",
            descriptor.name,
            handler.owner()
        ));

        tools.insert(
            descriptor.name.clone(),
            RegisteredTool { descriptor, handler },
        );
        Ok(())
    }

    /// Register an in-process tool
    pub fn register_local(&self, tool: Arc<dyn LocalTool>) -> ToolResult<()> {
        let descriptor = tool.descriptor();
        self.register(descriptor, ToolHandler::Local(tool))
    }

    /// Find the handler for a tool name
    pub fn resolve(&self, name: &str) -> ToolResult<ToolHandler> {
        self.tools
            .read()
            .get(name)
            .map(|t| t.handler.clone())
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Descriptor for a tool name
    pub fn descriptor(&self, name: &str) -> Option<ToolDescriptor> {
        self.tools.read().get(name).map(|t| t.descriptor.clone())
    }

    /// All descriptors, in registration order
    pub fn list_descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .read()
            .values()
            .map(|t| t.descriptor.clone())
            .collect()
    }

    /// Owner label of a registered tool
    pub fn owner_of(&self, name: &str) -> Option<String> {
        self.tools
            .read()
            .get(name)
            .map(|t| t.handler.owner().to_string())
    }

    /// Provider that hosts a tool, if the tool is provider-backed
    pub fn provider_of(&self, name: &str) -> Option<String> {
        match self.tools.read().get(name).map(|t| &t.handler) {
            Some(ToolHandler::Provider(provider)) => Some(provider.clone()),
            _ => None,
        }
    }

    /// Names of the tools owned by a provider, in registration order
    pub fn names_owned_by(&self, owner: &str) -> Vec<String> {
        self.tools
            .read()
            .values()
            .filter(|t| t.handler.owner() == owner)
            .map(|t| t.descriptor.name.clone())
            .collect()
    }

    /// Remove every tool owned by a provider. Returns the number removed.
    pub fn unregister_owner(&self, owner: &str) -> usize {
        let mut tools = self.tools.write();
        let before = tools.len();
        tools.retain(|_, t| t.handler.owner() != owner);
        let removed = before - tools.len();
        if removed > 0 {
            self.logger.debug(&format!(
                "[ToolRegistry] Removed {} tools owned by {}",
                removed, owner
            ));
        }
        removed
    }

    /// Whether a tool name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }
}

/// Check that a parameter schema describes an argument object
///
/// Accepts a JSON object whose `type`, when present, is `"object"`, whose
/// `properties`, when present, is an object, and whose `required`, when
/// present, is a list of strings naming declared properties.
pub fn validate_schema(tool: &str, schema: &Value) -> ToolResult<()> {
    let object = schema
        .as_object()
        .ok_or_else(|| ToolError::invalid_schema(tool, "schema must be a JSON object"))?;

    if let Some(kind) = object.get("type") {
        if kind.as_str() != Some("object") {
            return Err(ToolError::invalid_schema(
                tool,
                format!("expected type \"object\", found {}", kind),
            ));
        }
    }

    if let Some(properties) = object.get("properties") {
        if !properties.is_object() {
            return Err(ToolError::invalid_schema(tool, "\"properties\" must be an object"));
        }
    }

    if let Some(required) = object.get("required") {
        let names = required
            .as_array()
            .filter(|items| items.iter().all(Value::is_string))
            .ok_or_else(|| {
                ToolError::invalid_schema(tool, "\"required\" must be a list of property names")
            })?;

        if let Some(properties) = object.get("properties").and_then(Value::as_object) {
            for name in names.iter().filter_map(Value::as_str) {
                if !properties.contains_key(name) {
                    return Err(ToolError::invalid_schema(
                        tool,
                        format!("required property '{}' is not declared", name),
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::tools::FnTool;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(NoOpLogger))
    }

    fn search() -> ToolDescriptor {
        ToolDescriptor::new("search", "Search papers").with_schema(json!({
            "type": "object",
            "properties": { "topic": { "type": "string" } },
            "required": ["topic"]
        }))
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = registry();
        registry
            .register(search(), ToolHandler::Provider("research".into()))
            .unwrap();

        assert!(matches!(
            registry.resolve("search").unwrap(),
            ToolHandler::Provider(ref p) if p == "research"
        ));
        assert_eq!(registry.provider_of("search").as_deref(), Some("research"));
        assert_eq!(
            registry.resolve("nope").unwrap_err(),
            ToolError::UnknownTool("nope".into())
        );
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = registry();
        registry
            .register(search(), ToolHandler::Provider("alpha".into()))
            .unwrap();

        let err = registry
            .register(search(), ToolHandler::Provider("beta".into()))
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::DuplicateToolName {
                name: "search".into(),
                existing_owner: "alpha".into(),
                new_owner: "beta".into(),
            }
        );
        assert_eq!(registry.owner_of("search").as_deref(), Some("alpha"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_descriptors_keep_registration_order() {
        let registry = registry();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(ToolDescriptor::new(name, ""), ToolHandler::Provider("p".into()))
                .unwrap();
        }
        let names: Vec<_> = registry.list_descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_unregister_owner() {
        let registry = registry();
        registry.register(search(), ToolHandler::Provider("a".into())).unwrap();
        registry
            .register(ToolDescriptor::new("fetch", ""), ToolHandler::Provider("b".into()))
            .unwrap();
        registry
            .register_local(Arc::new(FnTool::sync(ToolDescriptor::new("clock", ""), |_| {
                Ok(json!("noon"))
            })))
            .unwrap();

        assert_eq!(registry.unregister_owner("a"), 1);
        assert!(!registry.contains("search"));
        assert_eq!(registry.names_owned_by("b"), ["fetch"]);
        assert_eq!(registry.owner_of("clock").as_deref(), Some(LOCAL_OWNER));
        assert_eq!(registry.provider_of("clock"), None);
    }

    #[test]
    fn test_invalid_schema_rejected_at_registration() {
        let registry = registry();
        let bad = ToolDescriptor::new("bad", "").with_schema(json!({ "type": "string" }));
        let err = registry
            .register(bad, ToolHandler::Provider("p".into()))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidSchema { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_validate_schema_cases() {
        assert!(validate_schema("t", &json!({})).is_ok());
        assert!(validate_schema("t", &json!({ "type": "object" })).is_ok());
        assert!(validate_schema("t", &json!("object")).is_err());
        assert!(validate_schema("t", &json!({ "properties": [] })).is_err());
        assert!(validate_schema("t", &json!({ "required": "topic" })).is_err());
        assert!(validate_schema("t", &json!({ "required": [1] })).is_err());
        assert!(validate_schema("t", &json!({ "required": ["topic"] })).is_ok());
        assert!(validate_schema(
            "t",
            &json!({ "properties": { "a": {} }, "required": ["b"] })
        )
        .is_err());
    }
}
