//! Configuration schema

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::ToolChoice;
use super::error::{ConfigError, ConfigResult};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// LLM endpoint and sampling settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Conversation loop settings
    #[serde(default)]
    pub chat: ChatSettings,

    /// Tool servers, in connection order
    #[serde(default, rename = "mcpServers", alias = "servers")]
    pub servers: IndexMap<String, ServerConfig>,
}

impl ChatConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        if self.llm.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.provider must not be empty".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".into()));
        }
        if self.chat.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "chat.max_iterations must be at least 1".into(),
            ));
        }
        if self.chat.turn_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "chat.turn_timeout_secs must be positive".into(),
            ));
        }
        for (name, server) in &self.servers {
            server.transport().map_err(|e| match e {
                ConfigError::Invalid(msg) => ConfigError::Invalid(format!("server '{}': {}", name, msg)),
                other => other,
            })?;
        }
        Ok(())
    }
}

/// LLM settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider id: openai, azure, anthropic, ollama, openai-compatible, mock, ...
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name, or the deployment name for Azure
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Azure api-version query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub tool_choice: ToolChoice,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base: None,
            api_key_env: None,
            api_version: None,
            temperature: None,
            max_tokens: None,
            tool_choice: ToolChoice::Auto,
        }
    }
}

/// How the transcript carries over between queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Keep the whole transcript for the session
    #[default]
    Retain,
    /// Start every query with an empty transcript
    Fresh,
}

/// Conversation loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// LLM requests allowed per user query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_timeout_secs: Option<u64>,

    #[serde(default)]
    pub history: HistoryPolicy,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            turn_timeout_secs: None,
            history: HistoryPolicy::Retain,
        }
    }
}

/// One tool server entry
///
/// Exactly one of `command` (stdio child process) or `url` (streamable HTTP)
/// must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Resolved transport for a server entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTransport {
    Stdio {
        command: String,
        args: Vec<String>,
        env: IndexMap<String, String>,
    },
    Http {
        url: String,
    },
}

impl ServerConfig {
    /// A stdio server launched as a child process
    pub fn stdio(command: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: Some(command.into()),
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// A streamable HTTP server
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Resolve which transport this entry describes
    pub fn transport(&self) -> ConfigResult<ServerTransport> {
        match (&self.command, &self.url) {
            (Some(command), None) if !command.trim().is_empty() => Ok(ServerTransport::Stdio {
                command: command.clone(),
                args: self.args.clone(),
                env: self.env.clone().unwrap_or_default(),
            }),
            (None, Some(url)) if !url.trim().is_empty() => Ok(ServerTransport::Http { url: url.clone() }),
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "set either command or url, not both".into(),
            )),
            _ => Err(ConfigError::Invalid("one of command or url is required".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.chat.max_iterations, 10);
        assert_eq!(config.chat.history, HistoryPolicy::Retain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parses_server_json_layout() {
        let json = r#"{
            "mcpServers": {
                "research": { "command": "uv", "args": ["run", "research_server.py"] },
                "fetch": { "command": "uvx", "args": ["mcp-server-fetch"], "env": null },
                "remote": { "url": "http://localhost:8000/mcp" }
            }
        }"#;
        let config: ChatConfig = serde_yaml::from_str(json).unwrap();
        let names: Vec<_> = config.servers.keys().cloned().collect();
        assert_eq!(names, ["research", "fetch", "remote"]);
        assert!(matches!(
            config.servers["remote"].transport().unwrap(),
            ServerTransport::Http { .. }
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let mut config = ChatConfig::default();
        config.chat.max_iterations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_server_needs_exactly_one_transport() {
        let both = ServerConfig {
            command: Some("uv".into()),
            url: Some("http://x".into()),
            ..Default::default()
        };
        assert!(both.transport().is_err());
        assert!(ServerConfig::default().transport().is_err());

        let mut config = ChatConfig::default();
        config.servers.insert("broken".into(), ServerConfig::default());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("broken"));
    }

    #[test]
    fn test_stdio_env_is_kept() {
        let server = ServerConfig::stdio("npx", ["-y", "server-filesystem"]).with_env("ROOT", "/tmp");
        match server.transport().unwrap() {
            ServerTransport::Stdio { command, args, env } => {
                assert_eq!(command, "npx");
                assert_eq!(args.len(), 2);
                assert_eq!(env["ROOT"], "/tmp");
            }
            other => panic!("unexpected transport {:?}", other),
        }
    }
}
