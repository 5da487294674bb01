//! Session wiring
//!
//! Builds the provider, registry, multiplexer and executor described by a
//! [`ChatConfig`] and hands out orchestrators that share them.

use std::sync::Arc;

use crate::config::ChatConfig;
use crate::logging::Logger;
use crate::providers::{create_provider, Provider, ProviderModelConfig};
use crate::secrets::{EnvSecretStore, SecretStore};
use crate::tools::{
    ConnectReport, LocalTool, ToolExecutor, ToolProvider, ToolProviderMultiplexer, ToolRegistry,
    ToolResult,
};
use super::error::ChatResult;
use super::orchestrator::{ConversationOrchestrator, OrchestratorOptions};

/// Everything one chat session needs
pub struct ChatContext {
    config: ChatConfig,
    provider: Arc<dyn Provider>,
    model: ProviderModelConfig,
    registry: Arc<ToolRegistry>,
    multiplexer: Arc<ToolProviderMultiplexer>,
    executor: Arc<ToolExecutor>,
    report: ConnectReport,
    logger: Arc<dyn Logger>,
}

impl ChatContext {
    /// Validate the config, create the LLM provider from environment secrets
    /// and connect every configured tool server.
    ///
    /// Servers that fail to connect are logged and left out; the session
    /// continues with the rest.
    pub async fn from_config(config: ChatConfig, logger: Arc<dyn Logger>) -> ChatResult<Self> {
        Self::from_config_with_secrets(config, &EnvSecretStore, logger).await
    }

    pub async fn from_config_with_secrets(
        config: ChatConfig,
        secrets: &dyn SecretStore,
        logger: Arc<dyn Logger>,
    ) -> ChatResult<Self> {
        config.validate()?;
        let (provider, model) = create_provider(&config.llm, secrets, logger.clone())?;
        logger.info(&format!(
            "[ChatContext] Using {} model {}",
            provider.name(),
            model.model
        ));

        let mut context = Self::with_provider(config, provider, model, logger);
        context.connect_servers().await;
        Ok(context)
    }

    /// Assemble a context around an existing provider without connecting
    /// any tool server
    pub fn with_provider(
        config: ChatConfig,
        provider: Arc<dyn Provider>,
        model: ProviderModelConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let registry = Arc::new(ToolRegistry::new(logger.clone()));
        let multiplexer = Arc::new(ToolProviderMultiplexer::new(registry.clone(), logger.clone()));
        let executor = Arc::new(ToolExecutor::new(registry.clone(), multiplexer.clone(), logger.clone()));
        Self {
            config,
            provider,
            model,
            registry,
            multiplexer,
            executor,
            report: ConnectReport::default(),
            logger,
        }
    }

    /// Connect the servers listed in the config
    pub async fn connect_servers(&mut self) -> &ConnectReport {
        let report = self.multiplexer.connect_all(&self.config.servers).await;
        for outcome in report.failed() {
            if let Err(e) = &outcome.result {
                self.logger.warn(&format!(
                    "[ChatContext] Continuing without {}: {}",
                    outcome.provider, e
                ));
            }
        }
        self.report = report;
        &self.report
    }

    /// Add a tool provider that is not described by the config
    pub async fn attach_provider(&self, name: &str, provider: Box<dyn ToolProvider>) -> ToolResult<Vec<String>> {
        self.multiplexer.attach(name, provider).await
    }

    pub fn register_local_tool(&self, tool: Arc<dyn LocalTool>) -> ToolResult<()> {
        self.registry.register_local(tool)
    }

    /// A fresh orchestrator configured from the session settings
    pub fn orchestrator(&self) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            self.provider.clone(),
            self.model.clone(),
            self.executor.clone(),
            self.logger.clone(),
        )
        .with_options(OrchestratorOptions::from(&self.config))
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn model(&self) -> &ProviderModelConfig {
        &self.model
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn multiplexer(&self) -> &Arc<ToolProviderMultiplexer> {
        &self.multiplexer
    }

    pub fn executor(&self) -> &Arc<ToolExecutor> {
        &self.executor
    }

    /// Result of the last [`connect_servers`](Self::connect_servers)
    pub fn connect_report(&self) -> &ConnectReport {
        &self.report
    }

    /// Close every tool provider
    pub async fn shutdown(&self) {
        for (provider, e) in self.multiplexer.shutdown().await {
            self.logger.warn(&format!("[ChatContext] Error closing {}: {}", provider, e));
        }
    }
}
