//! File-based configuration (YAML, JSON accepted)
//!
//! Supports user-level (~/.config/toolchat/config.yaml) and workspace-level
//! (.config/toolchat/config.yaml) files, plus an explicit path.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use super::settings::ChatConfig;

const APP_DIR: &str = "toolchat";
const FILE_NAME: &str = "config.yaml";

/// Where a config file came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// Path given on the command line
    Explicit,
    /// .config/toolchat/config.yaml in the workspace root
    Workspace,
    /// ~/.config/toolchat/config.yaml
    User,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::Explicit => "explicit",
            ConfigLevel::Workspace => "workspace",
            ConfigLevel::User => "user",
        }
    }
}

/// A configuration file at a known location
///
/// # Example
///
/// ```no_run
/// use toolchat_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// let workspace_config = FileConfigProvider::workspace("/path/to/workspace");
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
        }
    }

    /// User-level config provider
    pub fn user() -> Self {
        // XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join(APP_DIR).join(FILE_NAME), ConfigLevel::User)
    }

    /// Workspace-level config provider
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join(APP_DIR)
            .join(FILE_NAME);
        Self::new(path, ConfigLevel::Workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read, parse and validate the file
    pub fn load(&self) -> ConfigResult<ChatConfig> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = parse_config(&content).map_err(|message| ConfigError::Parse {
            path: self.path.clone(),
            message,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as YAML, creating parent directories
    pub fn save(&self, config: &ChatConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)
            .map_err(|e| ConfigError::Other(format!("Failed to serialize YAML: {}", e)))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Parse config text. Empty documents yield the defaults.
pub fn parse_config(content: &str) -> Result<ChatConfig, String> {
    if content.trim().is_empty() {
        return Ok(ChatConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| e.to_string())
}

/// A loaded configuration and the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ChatConfig,
    /// `None` when no file was found and defaults are in use
    pub source: Option<FileConfigProvider>,
}

/// Find and load the configuration
///
/// Lookup order: the explicit path (which must exist), the workspace file,
/// the user file, then built-in defaults.
pub fn discover(explicit: Option<&Path>, workspace_root: impl AsRef<Path>) -> ConfigResult<LoadedConfig> {
    discover_in(explicit, workspace_root, FileConfigProvider::user())
}

fn discover_in(
    explicit: Option<&Path>,
    workspace_root: impl AsRef<Path>,
    user: FileConfigProvider,
) -> ConfigResult<LoadedConfig> {
    if let Some(path) = explicit {
        let provider = FileConfigProvider::new(path, ConfigLevel::Explicit);
        let config = provider.load()?;
        return Ok(LoadedConfig {
            config,
            source: Some(provider),
        });
    }

    for provider in [FileConfigProvider::workspace(workspace_root), user] {
        if provider.exists() {
            let config = provider.load()?;
            return Ok(LoadedConfig {
                config,
                source: Some(provider),
            });
        }
    }

    Ok(LoadedConfig {
        config: ChatConfig::default(),
        source: None,
    })
}
