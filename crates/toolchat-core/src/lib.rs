//! toolchat core
//!
//! Connects an LLM to tool servers speaking the Model Context Protocol and
//! runs the tool-calling loop between them.
//!
//! ## Conversation loop
//!
//! The `chat` module drives a conversation: each user query is sent to the
//! LLM with every registered tool, requested tools are executed and their
//! results fed back until the LLM gives a final answer.
//!
//! ```rust,ignore
//! use toolchat_core::chat::ChatContext;
//! use toolchat_core::config::discover;
//!
//! let loaded = discover(None, std::env::current_dir()?)?;
//! let context = ChatContext::from_config(loaded.config, logger).await?;
//!
//! let mut chat = context.orchestrator();
//! let answer = chat.process_query("Find two papers on diffusion models").await?;
//!
//! context.shutdown().await;
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod tools;
pub mod mcp;
pub mod chat;

// Re-export commonly used types
pub use types::{
    CancellationToken, ChatMessage, CompletionResponse, MessageRole, StreamChunk, ToolCallRequest,
    ToolChoice, ToolDescriptor,
};

pub use secrets::{EnvSecretStore, MemorySecretStore, SecretStore};

pub use logging::{ConsoleLogger, FileLogger, LogLevel, Logger, MemoryLogger, NoOpLogger};

pub use config::{ChatConfig, ConfigError, FileConfigProvider, ServerConfig};

pub use providers::{create_provider, Provider, ProviderError};

pub use tools::{
    LocalTool, ToolError, ToolExecutor, ToolProvider, ToolProviderMultiplexer, ToolRegistry,
};

pub use mcp::{McpClient, McpError};

pub use chat::{ChatContext, ChatError, ConversationOrchestrator, TurnState};
