//! MCP (Model Context Protocol) client module
//!
//! Uses the official rmcp SDK to connect to tool servers. Supports child
//! process (stdio) and streamable HTTP transports.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolchat_core::config::ServerConfig;
//! use toolchat_core::mcp::McpClient;
//!
//! let config = ServerConfig::stdio("uv", ["run", "research_server.py"]);
//! let client = McpClient::connect("research", &config, logger).await?;
//!
//! let tools = client.list_tools().await?;
//! let result = client.call_tool("search_papers", args).await?;
//! ```

mod client;

pub use client::{descriptor_from_mcp, output_from_result, McpClient, McpError, McpResult};

// Re-export rmcp types that consumers might need
pub use rmcp::model::{CallToolResult as McpToolResult, Tool as McpTool};
