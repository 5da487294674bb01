//! MCP client using the official rmcp SDK
//!
//! Connects to MCP servers launched as child processes (stdio) or reachable
//! over streamable HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::RunningService,
    transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess},
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;

use crate::config::{ServerConfig, ServerTransport};
use crate::logging::Logger;
use crate::tools::{ProviderOutput, ToolError, ToolProvider, ToolResult};
use crate::types::ToolDescriptor;

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid server config: {0}")]
    InvalidConfig(String),

    #[error("Connection closed")]
    Closed,
}

pub type McpResult<T> = Result<T, McpError>;

/// Client for one MCP server
pub struct McpClient {
    name: String,
    /// `None` once closed
    client: Option<RunningService<RoleClient, ClientInfo>>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Connect using a server config entry
    pub async fn connect(name: &str, config: &ServerConfig, logger: Arc<dyn Logger>) -> McpResult<Self> {
        match config
            .transport()
            .map_err(|e| McpError::InvalidConfig(e.to_string()))?
        {
            ServerTransport::Stdio { command, args, env } => {
                Self::connect_stdio(name, &command, &args, &env, logger).await
            }
            ServerTransport::Http { url } => Self::connect_http(name, &url, logger).await,
        }
    }

    /// Launch a server as a child process and talk to it over stdio
    pub async fn connect_stdio(
        name: &str,
        command: &str,
        args: &[String],
        env: &IndexMap<String, String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        logger.info(&format!(
            "[McpClient] Launching {}: {} {}",
            name,
            command,
            args.join(" ")
        ));

        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(args).envs(env.iter());
        }))
        .map_err(|e| McpError::ConnectionFailed(format!("failed to launch '{}': {}", command, e)))?;

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info(&format!("[McpClient] {} initialized", name));

        Ok(Self {
            name: name.to_string(),
            client: Some(client),
            logger,
        })
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(name: &str, url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        logger.info(&format!("[McpClient] Connecting {} to HTTP: {}", name, url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info(&format!("[McpClient] {} initialized", name));

        Ok(Self {
            name: name.to_string(),
            client: Some(client),
            logger,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn running(&self) -> McpResult<&RunningService<RoleClient, ClientInfo>> {
        self.client.as_ref().ok_or(McpError::Closed)
    }

    /// List all available tools
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let result = self
            .running()?
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.debug(&format!(
            "[McpClient] {} listed {} tools",
            self.name,
            result.tools.len()
        ));

        Ok(result.tools)
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<CallToolResult> {
        self.logger
            .debug(&format!("[McpClient] {} calling tool: {}", self.name, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        self.running()?
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))
    }

    /// Get server info
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client
            .as_ref()
            .and_then(|c| c.peer_info())
            .map(|info| &info.server_info)
    }

    /// Close the connection. Later calls are no-ops.
    pub async fn close(&mut self) -> McpResult<()> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        self.logger
            .info(&format!("[McpClient] Closing connection to {}", self.name));
        client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolchat".to_string(),
            title: Some("toolchat".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Convert an MCP tool into the descriptor advertised to the LLM
pub fn descriptor_from_mcp(tool: &Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool
            .description
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        parameter_schema: Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Keep the text items of a tool result, in order
pub fn output_from_result(result: &CallToolResult) -> ProviderOutput {
    // Content is Annotated<RawContent>; .raw is the RawContent
    let texts = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect();

    ProviderOutput {
        texts,
        is_error: result.is_error.unwrap_or(false),
    }
}

#[async_trait]
impl ToolProvider for McpClient {
    async fn list_tools(&mut self) -> ToolResult<Vec<ToolDescriptor>> {
        let tools = McpClient::list_tools(self)
            .await
            .map_err(|e| ToolError::connection_failure(&self.name, e.to_string()))?;
        Ok(tools.iter().map(descriptor_from_mcp).collect())
    }

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> ToolResult<ProviderOutput> {
        match McpClient::call_tool(self, name, arguments).await {
            Ok(result) => Ok(output_from_result(&result)),
            Err(McpError::Closed) => Err(ToolError::ProviderClosed(self.name.clone())),
            Err(e) => Err(ToolError::execution_failure(name, e.to_string())),
        }
    }

    async fn close(&mut self) -> ToolResult<()> {
        McpClient::close(self)
            .await
            .map_err(|e| ToolError::connection_failure(&self.name, e.to_string()))
    }
}
