//! Configuration management
//!
//! A single [`ChatConfig`] describes the LLM endpoint, the conversation loop
//! and the tool servers to connect. Files are YAML; JSON files in the
//! `mcpServers` layout parse as well.

mod error;
mod file;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::{discover, parse_config, ConfigLevel, FileConfigProvider, LoadedConfig};
pub use settings::{
    ChatConfig, ChatSettings, HistoryPolicy, LlmSettings, ServerConfig, ServerTransport,
    DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL, DEFAULT_PROVIDER,
};
