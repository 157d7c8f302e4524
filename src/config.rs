//! termbridge configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main termbridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermBridgeConfig {
    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Assistant backend configuration
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// SSH executor configuration
    #[serde(default)]
    pub ssh: SshConfig,

    /// Conversation history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS
    pub allowed_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1010,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Assistant backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Base URL of the Ollama-compatible backend
    pub base_url: String,

    /// Model used when a request does not name one
    pub default_model: String,

    /// Persona priming assistant prompts
    pub persona: Persona,

    /// Completion request timeout in seconds
    pub request_timeout_secs: u64,

    /// Reachability probe timeout in seconds
    pub probe_timeout_secs: u64,

    /// Probe the backend on startup
    pub probe_on_start: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            default_model: "llama2".to_string(),
            persona: Persona::default(),
            request_timeout_secs: 300,
            probe_timeout_secs: 5,
            probe_on_start: true,
        }
    }
}

/// Name/role pair used to prime assistant prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Display name the assistant answers as
    pub name: String,

    /// Role description woven into the prompt preamble
    pub role: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Assistant".to_string(),
            role: "Linux Expert".to_string(),
        }
    }
}

/// SSH executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,

    /// Remote command completion timeout in seconds
    pub command_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            command_timeout_secs: 60,
        }
    }
}

/// Conversation history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Sliding-window cap on stored messages per session
    pub max_messages: usize,

    /// Trailing slice of history sent as model context
    pub context_window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: 100,
            context_window: 10,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the settings/saved-hosts JSON file
    pub settings_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs_next::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            settings_path: base.join("termbridge").join("settings.json"),
        }
    }
}
