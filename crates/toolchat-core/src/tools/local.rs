//! In-process tools

use std::error::Error;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};

use crate::types::ToolDescriptor;
use super::error::{ToolError, ToolResult};
use super::normalize::normalize_value;
use super::provider::{ProviderOutput, ToolProvider};

pub type LocalToolError = Box<dyn Error + Send + Sync>;
pub type LocalToolResult = Result<Value, LocalToolError>;

/// A tool implemented in this process
///
/// The return value can be any JSON value; the executor normalizes it to
/// text before it goes back to the model.
#[async_trait]
pub trait LocalTool: Send + Sync {
    /// Descriptor advertised to the LLM
    fn descriptor(&self) -> ToolDescriptor;

    /// Invoke the tool with named arguments
    async fn call(&self, arguments: Map<String, Value>) -> LocalToolResult;
}

/// Run a local tool, turning returned errors and panics into [`ToolError`]
pub(crate) async fn call_guarded(tool: &dyn LocalTool, name: &str, arguments: Map<String, Value>) -> ToolResult<Value> {
    match AssertUnwindSafe(tool.call(arguments)).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ToolError::execution_failure(name, e.to_string())),
        Err(panic) => Err(ToolError::panicked(name, panic.as_ref())),
    }
}

type BoxedToolFn = Box<dyn Fn(Map<String, Value>) -> BoxFuture<'static, LocalToolResult> + Send + Sync>;

/// Adapter turning a closure into a [`LocalTool`]
pub struct FnTool {
    descriptor: ToolDescriptor,
    func: BoxedToolFn,
}

impl FnTool {
    /// Wrap an async closure
    pub fn new<F, Fut>(descriptor: ToolDescriptor, func: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LocalToolResult> + Send + 'static,
    {
        Self {
            descriptor,
            func: Box::new(move |args| Box::pin(func(args))),
        }
    }

    /// Wrap a synchronous closure
    pub fn sync<F>(descriptor: ToolDescriptor, func: F) -> Self
    where
        F: Fn(Map<String, Value>) -> LocalToolResult + Send + Sync + 'static,
    {
        Self::new(descriptor, move |args| futures::future::ready(func(args)))
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.descriptor.name)
            .finish()
    }
}

#[async_trait]
impl LocalTool for FnTool {
    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    async fn call(&self, arguments: Map<String, Value>) -> LocalToolResult {
        (self.func)(arguments).await
    }
}

/// A group of local tools exposed through the [`ToolProvider`] boundary
///
/// Lets in-process modules be attached to the multiplexer next to remote
/// servers.
#[derive(Default)]
pub struct LocalToolProvider {
    tools: Vec<Arc<dyn LocalTool>>,
}

impl LocalToolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: impl LocalTool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn with_shared(mut self, tool: Arc<dyn LocalTool>) -> Self {
        self.tools.push(tool);
        self
    }
}

#[async_trait]
impl ToolProvider for LocalToolProvider {
    async fn list_tools(&mut self) -> ToolResult<Vec<ToolDescriptor>> {
        Ok(self.tools.iter().map(|t| t.descriptor()).collect())
    }

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> ToolResult<ProviderOutput> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.descriptor().name == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let value = call_guarded(tool.as_ref(), name, arguments).await?;

        Ok(ProviderOutput::text(normalize_value(&value)))
    }

    async fn close(&mut self) -> ToolResult<()> {
        Ok(())
    }
}
