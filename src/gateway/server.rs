//! Gateway server lifecycle

use crate::assistant::{AssistantBackend, OllamaClient};
use crate::config::TermBridgeConfig;
use crate::error::{Error, Result};
use crate::session::SessionManager;
use crate::settings::SettingsStore;
use crate::ssh::{ShellConnector, SshConnector};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Gateway server state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// Not started
    Stopped,
    /// Starting up
    Starting,
    /// Running
    Running,
    /// Shutting down
    ShuttingDown,
}

/// termbridge gateway server
///
/// Owns the shared collaborators (session manager, settings store, assistant
/// client) and the start/stop lifecycle. HTTP serving is the caller's
/// concern; the router comes from [`crate::api::build_app`].
pub struct Gateway {
    config: TermBridgeConfig,
    state: Arc<RwLock<GatewayState>>,
    sessions: Arc<SessionManager>,
    settings: Arc<SettingsStore>,
    assistant: Arc<dyn AssistantBackend>,
}

impl Gateway {
    /// Create a new gateway with the given configuration
    pub async fn new(config: TermBridgeConfig) -> Result<Self> {
        let settings = Arc::new(SettingsStore::open(&config.storage.settings_path).await?);
        let assistant: Arc<dyn AssistantBackend> =
            Arc::new(OllamaClient::new(&config.assistant));
        let connector: Arc<dyn ShellConnector> = Arc::new(SshConnector::new(&config.ssh));

        let sessions = Arc::new(SessionManager::new(
            connector,
            assistant.clone(),
            settings.clone(),
            config.clone(),
        ));

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(GatewayState::Stopped)),
            sessions,
            settings,
            assistant,
        })
    }

    /// Get current state
    pub async fn state(&self) -> GatewayState {
        *self.state.read().await
    }

    /// Start the gateway
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if *state != GatewayState::Stopped {
            return Err(Error::Gateway("Gateway already running".to_string()));
        }
        *state = GatewayState::Starting;
        drop(state);

        tracing::info!("Starting termbridge gateway");

        // Initial auto-connect check: a dead backend is reported, not fatal —
        // the user can reconnect through the probe endpoint later.
        if self.config.assistant.probe_on_start {
            match self.assistant.probe(&self.config.assistant.base_url).await {
                Ok(models) => tracing::info!(
                    url = %self.config.assistant.base_url,
                    models = models.len(),
                    "assistant backend reachable"
                ),
                Err(e) => tracing::warn!(
                    url = %self.config.assistant.base_url,
                    "assistant backend not reachable: {}",
                    e
                ),
            }
        }

        *self.state.write().await = GatewayState::Running;

        tracing::info!(
            "termbridge gateway started on {}:{}",
            self.config.gateway.host,
            self.config.gateway.port
        );

        Ok(())
    }

    /// Stop the gateway
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if *state != GatewayState::Running {
            return Ok(());
        }
        *state = GatewayState::ShuttingDown;
        drop(state);

        tracing::info!("Stopping termbridge gateway");

        *self.state.write().await = GatewayState::Stopped;

        tracing::info!("termbridge gateway stopped");

        Ok(())
    }

    /// Get the session manager
    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Get the settings store
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Get the assistant backend client
    pub fn assistant(&self) -> &Arc<dyn AssistantBackend> {
        &self.assistant
    }

    /// Get the configuration
    pub fn config(&self) -> &TermBridgeConfig {
        &self.config
    }
}

/// Builder for Gateway
pub struct GatewayBuilder {
    config: TermBridgeConfig,
}

impl GatewayBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: TermBridgeConfig::default(),
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: TermBridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the gateway host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.gateway.host = host.into();
        self
    }

    /// Set the gateway port
    pub fn port(mut self, port: u16) -> Self {
        self.config.gateway.port = port;
        self
    }

    /// Set the settings file path
    pub fn settings_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.storage.settings_path = path.into();
        self
    }

    /// Skip the startup assistant probe
    pub fn no_probe(mut self) -> Self {
        self.config.assistant.probe_on_start = false;
        self
    }

    /// Build the gateway
    pub async fn build(self) -> Result<Gateway> {
        Gateway::new(self.config).await
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn gateway(dir: &TempDir) -> Gateway {
        GatewayBuilder::new()
            .host("127.0.0.1")
            .port(11010)
            .settings_path(dir.path().join("settings.json"))
            .no_probe()
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_gateway_creation() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir).await;

        assert_eq!(gateway.state().await, GatewayState::Stopped);
        assert_eq!(gateway.config().gateway.port, 11010);
        assert_eq!(gateway.session_manager().session_count().await, 0);
    }

    #[tokio::test]
    async fn test_gateway_lifecycle() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir).await;

        gateway.start().await.unwrap();
        assert_eq!(gateway.state().await, GatewayState::Running);

        // double start is rejected
        assert!(gateway.start().await.is_err());

        gateway.stop().await.unwrap();
        assert_eq!(gateway.state().await, GatewayState::Stopped);

        // stop when already stopped is a no-op
        gateway.stop().await.unwrap();
    }
}
