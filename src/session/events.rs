//! Wire events exchanged with the browser
//!
//! JSON objects tagged by `event` (kebab-case names), payload fields in
//! camelCase. Outbound events carry `success` plus either the result or a
//! human-readable error, so the browser never has to interpret raw failures.

use crate::config::Persona;
use crate::history::Message;
use serde::{Deserialize, Serialize};

/// Events received from the browser
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Open (or replace) the session's SSH connection
    ConnectSsh {
        host: String,
        #[serde(default = "default_ssh_port")]
        port: u16,
        username: String,
        #[serde(default)]
        password: Option<String>,
        #[serde(default)]
        key_file: Option<String>,
        /// When present, auto-register the profile as a saved host
        #[serde(default)]
        name: Option<String>,
    },

    /// Tear down the SSH connection (idempotent)
    DisconnectSsh,

    /// Raw terminal command
    RunCommand { command: String },

    /// Free-form assistant chat
    AiPrompt {
        prompt: String,
        #[serde(default)]
        model: Option<String>,
        /// Client-side transcript used to seed an empty server history
        #[serde(default)]
        history: Option<Vec<Message>>,
    },

    /// Natural language to shell command
    AiGenerateCommand {
        description: String,
        #[serde(default)]
        persona: Option<Persona>,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        auto_run: bool,
    },

    /// Resync request for a freshly loaded tab
    GetHistory,

    /// Wipe the conversation
    ClearHistory,
}

fn default_ssh_port() -> u16 {
    22
}

/// Classification of an auto-run command result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Success,
    Error,
}

/// Events sent to the browser
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Connection acknowledged; carries the session identifier
    Ready { session_id: String },

    /// Outcome of a connect/disconnect request
    SshStatus { connected: bool, message: String },

    /// Raw terminal command result
    CommandOutput { success: bool, output: String },

    /// Free-form chat result, with the full synced transcript
    AiResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        history: Option<Vec<Message>>,
    },

    /// Staged or about-to-run generated command
    CommandGenerated {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        auto_run: bool,
    },

    /// Outcome of an auto-run generated command
    AiCommandResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(rename = "type")]
        kind: ResultKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        history: Option<Vec<Message>>,
    },

    /// Full transcript snapshot
    History { success: bool, history: Vec<Message> },

    /// Acknowledges a clear-history request
    HistoryCleared { success: bool },
}
