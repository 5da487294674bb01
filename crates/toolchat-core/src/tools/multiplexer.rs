//! Routing of tool calls across tool providers
//!
//! The multiplexer owns every provider handle. Each handle sits behind its
//! own async mutex so calls to one provider are serialized while calls to
//! different providers proceed independently.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use indexmap::IndexMap;
use parking_lot::{Mutex as SyncMutex, RwLock};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::logging::Logger;
use crate::mcp::McpClient;
use crate::types::ToolDescriptor;
use super::error::{ToolError, ToolResult};
use super::normalize::normalize_provider_output;
use super::provider::ToolProvider;
use super::registry::{validate_schema, ToolHandler, ToolRegistry};

type SharedProvider = Arc<Mutex<Box<dyn ToolProvider>>>;

/// Outcome of connecting one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub provider: String,
    /// Names of the registered tools, or why the provider was dropped
    pub result: ToolResult<Vec<String>>,
}

/// Per-provider results of [`ToolProviderMultiplexer::connect_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectReport {
    pub outcomes: Vec<ConnectOutcome>,
}

impl ConnectReport {
    pub fn connected(&self) -> impl Iterator<Item = &ConnectOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ConnectOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn all_connected(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Owns tool provider handles and routes calls to them
pub struct ToolProviderMultiplexer {
    registry: Arc<ToolRegistry>,
    providers: RwLock<IndexMap<String, SharedProvider>>,
    /// Names with a connect or attach in progress
    pending: SyncMutex<HashSet<String>>,
    logger: Arc<dyn Logger>,
}

/// Claim on a provider name, released on drop
struct NameReservation<'a> {
    pending: &'a SyncMutex<HashSet<String>>,
    name: String,
}

impl Drop for NameReservation<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.name);
    }
}

impl ToolProviderMultiplexer {
    pub fn new(registry: Arc<ToolRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self {
            registry,
            providers: RwLock::new(IndexMap::new()),
            pending: SyncMutex::new(HashSet::new()),
            logger,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Connect to a configured MCP server and register its tools
    pub async fn connect(&self, name: &str, config: &ServerConfig) -> ToolResult<Vec<String>> {
        let reservation = self.reserve(name)?;

        let client = McpClient::connect(name, config, self.logger.clone())
            .await
            .map_err(|e| ToolError::connection_failure(name, e.to_string()))?;

        self.register_provider(reservation, Box::new(client)).await
    }

    /// Register the tools of an already connected provider
    ///
    /// On any failure the provider is closed before the error is returned
    /// and none of its tools stay registered.
    pub async fn attach(&self, name: &str, mut provider: Box<dyn ToolProvider>) -> ToolResult<Vec<String>> {
        match self.reserve(name) {
            Ok(reservation) => self.register_provider(reservation, provider).await,
            Err(e) => {
                self.close_rejected(name, provider.as_mut()).await;
                Err(e)
            }
        }
    }

    /// List, check and register the tools of a provider whose name is held
    async fn register_provider(
        &self,
        reservation: NameReservation<'_>,
        mut provider: Box<dyn ToolProvider>,
    ) -> ToolResult<Vec<String>> {
        let name = reservation.name.as_str();

        let descriptors = match provider.list_tools().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                self.logger.error(&format!(
                    "[ToolMultiplexer] Failed to list tools from {}: {}",
                    name, e
                ));
                self.close_rejected(name, provider.as_mut()).await;
                return Err(ToolError::connection_failure(name, e.to_string()));
            }
        };

        let accepted = match self.check_descriptors(name, descriptors) {
            Ok(accepted) => accepted,
            Err(e) => {
                self.logger.error(&format!("[ToolMultiplexer] {}", e));
                self.close_rejected(name, provider.as_mut()).await;
                return Err(e);
            }
        };

        let names: Vec<String> = accepted.iter().map(|d| d.name.clone()).collect();
        for descriptor in accepted {
            // check_descriptors ran without the registry lock; a concurrent
            // attach can still claim a name first
            if let Err(e) = self
                .registry
                .register(descriptor, ToolHandler::Provider(name.to_string()))
            {
                self.logger.error(&format!("[ToolMultiplexer] {}", e));
                self.registry.unregister_owner(name);
                self.close_rejected(name, provider.as_mut()).await;
                return Err(e);
            }
        }

        self.providers
            .write()
            .insert(name.to_string(), Arc::new(Mutex::new(provider)));

        self.logger.info(&format!(
            "[ToolMultiplexer] Connected to {} with tools: [{}]",
            name,
            names.join(", ")
        ));
        Ok(names)
    }

    /// Connect every server in order. Failures only affect their own entry.
    pub async fn connect_all(&self, servers: &IndexMap<String, ServerConfig>) -> ConnectReport {
        let mut report = ConnectReport::default();
        for (name, config) in servers {
            let result = self.connect(name, config).await;
            if let Err(ref e) = result {
                self.logger.error(&format!(
                    "[ToolMultiplexer] Skipping provider {}: {}",
                    name, e
                ));
            }
            report.outcomes.push(ConnectOutcome {
                provider: name.clone(),
                result,
            });
        }
        report
    }

    /// Invoke a provider-backed tool and normalize its result text
    pub async fn dispatch(&self, tool_name: &str, arguments: Map<String, Value>) -> ToolResult<String> {
        let provider = self
            .registry
            .provider_of(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        let handle = self
            .providers
            .read()
            .get(&provider)
            .cloned()
            .ok_or_else(|| ToolError::ProviderClosed(provider.clone()))?;

        let output = {
            let mut guard = handle.lock().await;
            match AssertUnwindSafe(guard.call_tool(tool_name, arguments)).catch_unwind().await {
                Ok(result) => result?,
                Err(panic) => return Err(ToolError::panicked(tool_name, panic.as_ref())),
            }
        };

        let text = normalize_provider_output(&output);
        if output.is_error {
            Err(ToolError::execution_failure(tool_name, text))
        } else {
            Ok(text)
        }
    }

    /// Names of the connected providers, in connection order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }

    /// Descriptors grouped by provider, in connection order
    pub fn tools_by_provider(&self) -> Vec<(String, Vec<ToolDescriptor>)> {
        self.provider_names()
            .into_iter()
            .map(|provider| {
                let tools = self
                    .registry
                    .names_owned_by(&provider)
                    .iter()
                    .filter_map(|n| self.registry.descriptor(n))
                    .collect();
                (provider, tools)
            })
            .collect()
    }

    /// Close one provider and unregister its tools
    pub async fn disconnect(&self, name: &str) -> ToolResult<()> {
        let handle = self
            .providers
            .write()
            .shift_remove(name)
            .ok_or_else(|| ToolError::UnknownProvider(name.to_string()))?;
        self.registry.unregister_owner(name);

        let mut guard = handle.lock().await;
        guard.close().await
    }

    /// Close every provider exactly once
    ///
    /// Close failures are logged and returned; they never stop the remaining
    /// providers from closing. A second call finds nothing left to close.
    pub async fn shutdown(&self) -> Vec<(String, ToolError)> {
        let drained: Vec<(String, SharedProvider)> = self.providers.write().drain(..).collect();
        let mut failures = Vec::new();

        for (name, handle) in drained {
            self.registry.unregister_owner(&name);
            let mut guard = handle.lock().await;
            match guard.close().await {
                Ok(()) => self
                    .logger
                    .debug(&format!("[ToolMultiplexer] Closed {}", name)),
                Err(e) => {
                    self.logger.error(&format!(
                        "[ToolMultiplexer] Failed to close {}: {}",
                        name, e
                    ));
                    failures.push((name, e));
                }
            }
        }

        failures
    }

    fn reserve(&self, name: &str) -> ToolResult<NameReservation<'_>> {
        let mut pending = self.pending.lock();
        if pending.contains(name) || self.providers.read().contains_key(name) {
            return Err(ToolError::connection_failure(name, "a provider with this name is already connected"));
        }
        pending.insert(name.to_string());
        Ok(NameReservation {
            pending: &self.pending,
            name: name.to_string(),
        })
    }

    /// Drop invalid schemas and fail on the first name collision
    fn check_descriptors(&self, provider: &str, descriptors: Vec<ToolDescriptor>) -> ToolResult<Vec<ToolDescriptor>> {
        let mut accepted = Vec::with_capacity(descriptors.len());
        let mut seen = HashSet::new();

        for descriptor in descriptors {
            if let Err(e) = validate_schema(&descriptor.name, &descriptor.parameter_schema) {
                self.logger.warn(&format!(
                    "[ToolMultiplexer] Skipping tool from {}: {}",
                    provider, e
                ));
                continue;
            }

            if let Some(existing_owner) = self.registry.owner_of(&descriptor.name) {
                return Err(ToolError::DuplicateToolName {
                    name: descriptor.name,
                    existing_owner,
                    new_owner: provider.to_string(),
                });
            }
            if !seen.insert(descriptor.name.clone()) {
                return Err(ToolError::DuplicateToolName {
                    name: descriptor.name,
                    existing_owner: provider.to_string(),
                    new_owner: provider.to_string(),
                });
            }

            accepted.push(descriptor);
        }

        Ok(accepted)
    }

    async fn close_rejected(&self, name: &str, provider: &mut dyn ToolProvider) {
        if let Err(e) = provider.close().await {
            self.logger.warn(&format!(
                "[ToolMultiplexer] Failed to close rejected provider {}: {}",
                name, e
            ));
        }
    }
}
