//! Per-session state machine
//!
//! Owns one SSH connection slot, one bounded conversation, and the assistant
//! turn serialization for a single browser connection. Events are expected
//! to arrive one at a time (the gateway dispatches sequentially); the
//! internal locks make even out-of-band callers safe.

use crate::assistant::AssistantBackend;
use crate::config::{Persona, TermBridgeConfig};
use crate::history::{Conversation, Message, Role};
use crate::session::events::{ClientEvent, ResultKind, ServerEvent};
use crate::settings::{SavedHost, SettingsStore};
use crate::ssh::{ConnectionProfile, Credentials, ShellConnection, ShellConnector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// SSH side of the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// No SSH connection
    Idle,
    /// Connection being established
    Connecting,
    /// Live connection available
    Connected,
}

/// Connection slot guarded by one lock: holding it across an operation is
/// what serializes commands against the single channel.
struct Shell {
    state: ShellState,
    connection: Option<Box<dyn ShellConnection>>,
}

/// Outbound event channel for one connection
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl EventSink {
    /// Wrap the connection's outbound channel
    pub fn new(tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event to the owning connection only
    pub fn emit(&self, event: ServerEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("dropping event for closed connection");
        }
    }
}

/// One browser connection's complete state
pub struct Session {
    id: String,
    shell: Mutex<Shell>,
    conversation: Mutex<Conversation>,
    /// FIFO turn lock: at most one assistant request in flight, later
    /// requests queue behind it in submission order
    turn: Mutex<()>,
    busy: AtomicBool,
    connector: Arc<dyn ShellConnector>,
    assistant: Arc<dyn AssistantBackend>,
    settings: Arc<SettingsStore>,
    persona: Persona,
    default_model: String,
    context_window: usize,
}

impl Session {
    /// Create a session with no SSH connection and an empty conversation
    pub fn new(
        id: String,
        connector: Arc<dyn ShellConnector>,
        assistant: Arc<dyn AssistantBackend>,
        settings: Arc<SettingsStore>,
        config: &TermBridgeConfig,
    ) -> Self {
        Self {
            id,
            shell: Mutex::new(Shell {
                state: ShellState::Idle,
                connection: None,
            }),
            conversation: Mutex::new(Conversation::new(config.history.max_messages)),
            turn: Mutex::new(()),
            busy: AtomicBool::new(false),
            connector,
            assistant,
            settings,
            persona: config.assistant.persona.clone(),
            default_model: config.assistant.default_model.clone(),
            context_window: config.history.context_window,
        }
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether an assistant request is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Current SSH side of the state machine
    pub async fn shell_state(&self) -> ShellState {
        self.shell.lock().await.state
    }

    /// Route one inbound event to its handler
    pub async fn handle_event(&self, event: ClientEvent, sink: &EventSink) {
        match event {
            ClientEvent::ConnectSsh {
                host,
                port,
                username,
                password,
                key_file,
                name,
            } => {
                self.handle_connect(host, port, username, password, key_file, name, sink)
                    .await;
            }
            ClientEvent::DisconnectSsh => self.handle_disconnect(sink).await,
            ClientEvent::RunCommand { command } => self.handle_run_command(&command, sink).await,
            ClientEvent::AiPrompt {
                prompt,
                model,
                history,
            } => self.handle_prompt(prompt, model, history, sink).await,
            ClientEvent::AiGenerateCommand {
                description,
                persona,
                model,
                auto_run,
            } => {
                self.handle_generate(description, persona, model, auto_run, sink)
                    .await;
            }
            ClientEvent::GetHistory => {
                let history = self.conversation.lock().await.snapshot();
                sink.emit(ServerEvent::History {
                    success: true,
                    history,
                });
            }
            ClientEvent::ClearHistory => {
                self.conversation.lock().await.clear();
                sink.emit(ServerEvent::HistoryCleared { success: true });
            }
        }
    }

    /// Force-close the SSH connection; called when the transport goes away
    pub async fn teardown(&self) {
        let mut shell = self.shell.lock().await;
        if let Some(mut connection) = shell.connection.take() {
            connection.close().await;
        }
        shell.state = ShellState::Idle;
    }

    // =========================================================================
    // SSH events
    // =========================================================================

    async fn handle_connect(
        &self,
        host: String,
        port: u16,
        username: String,
        password: Option<String>,
        key_file: Option<String>,
        name: Option<String>,
        sink: &EventSink,
    ) {
        let host = host.trim().to_string();
        let username = username.trim().to_string();
        if host.is_empty() {
            sink.emit(ServerEvent::SshStatus {
                connected: false,
                message: "Host is required".to_string(),
            });
            return;
        }
        if username.is_empty() {
            sink.emit(ServerEvent::SshStatus {
                connected: false,
                message: "Username is required".to_string(),
            });
            return;
        }

        let profile = ConnectionProfile {
            host,
            port,
            username,
            credentials: Credentials {
                password: password.filter(|p| !p.is_empty()),
                key_file: key_file.filter(|k| !k.is_empty()),
            },
        };

        let mut shell = self.shell.lock().await;

        // At most one live channel: tear down any existing connection before
        // opening the new one.
        if let Some(mut old) = shell.connection.take() {
            old.close().await;
        }
        shell.state = ShellState::Connecting;

        match self.connector.connect(&profile).await {
            Ok(connection) => {
                shell.connection = Some(connection);
                shell.state = ShellState::Connected;
                drop(shell);

                tracing::info!(
                    session_id = %self.id,
                    host = %profile.host,
                    "SSH connected"
                );

                // Persist the now-working credentials; a storage hiccup does
                // not fail the connect.
                if let Err(e) = self.settings.record_connection(&profile).await {
                    tracing::warn!(session_id = %self.id, "failed to persist settings: {}", e);
                }
                if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                    let saved = SavedHost {
                        name,
                        host: profile.host.clone(),
                        port: profile.port,
                        username: profile.username.clone(),
                        credentials: profile.credentials.clone(),
                    };
                    if let Err(e) = self.settings.upsert_host(saved).await {
                        tracing::warn!(session_id = %self.id, "failed to save host: {}", e);
                    }
                }

                sink.emit(ServerEvent::SshStatus {
                    connected: true,
                    message: "Connected successfully".to_string(),
                });
            }
            Err(e) => {
                shell.state = ShellState::Idle;
                drop(shell);

                tracing::warn!(session_id = %self.id, "SSH connect failed: {}", e);
                sink.emit(ServerEvent::SshStatus {
                    connected: false,
                    message: format!("Connection failed: {}", e),
                });
            }
        }
    }

    async fn handle_disconnect(&self, sink: &EventSink) {
        self.teardown().await;
        sink.emit(ServerEvent::SshStatus {
            connected: false,
            message: "Disconnected".to_string(),
        });
    }

    async fn handle_run_command(&self, command: &str, sink: &EventSink) {
        let mut shell = self.shell.lock().await;
        let Some(connection) = shell.connection.as_mut() else {
            sink.emit(ServerEvent::CommandOutput {
                success: false,
                output: "Not connected to SSH server".to_string(),
            });
            return;
        };

        // Raw terminal output is ephemeral: never appended to the
        // conversation, and a failed command leaves the connection up.
        match connection.run(command).await {
            Ok(result) => sink.emit(ServerEvent::CommandOutput {
                success: true,
                output: result.output,
            }),
            Err(e) => sink.emit(ServerEvent::CommandOutput {
                success: false,
                output: e.to_string(),
            }),
        }
    }

    // =========================================================================
    // Assistant events
    // =========================================================================

    async fn handle_prompt(
        &self,
        prompt: String,
        model: Option<String>,
        seed: Option<Vec<Message>>,
        sink: &EventSink,
    ) {
        let _turn = self.turn.lock().await;
        self.busy.store(true, Ordering::SeqCst);

        let context = {
            let mut conversation = self.conversation.lock().await;
            // A fresh server-side transcript can be seeded from the client's
            // copy, e.g. after a server restart mid-conversation.
            if conversation.is_empty() {
                if let Some(seed) = seed {
                    for message in seed {
                        conversation.append(message);
                    }
                }
            }
            conversation.append(Message::new(Role::User, prompt.clone()));

            let mut window = conversation.window(self.context_window);
            // the new user turn travels as the prompt itself
            window.pop();
            window
        };

        let model = model.unwrap_or_else(|| self.default_model.clone());
        let result = self
            .assistant
            .complete(&prompt, &context, &model, &self.persona)
            .await;

        let mut conversation = self.conversation.lock().await;
        match result {
            Ok(reply) => {
                conversation.append(Message::new(Role::Assistant, reply.clone()));
                sink.emit(ServerEvent::AiResponse {
                    success: true,
                    response: Some(reply),
                    error: None,
                    history: Some(conversation.snapshot()),
                });
            }
            Err(e) => {
                let message = e.to_string();
                conversation.append(Message::error(message.clone()));
                sink.emit(ServerEvent::AiResponse {
                    success: false,
                    response: None,
                    error: Some(message),
                    history: Some(conversation.snapshot()),
                });
            }
        }

        self.busy.store(false, Ordering::SeqCst);
    }

    async fn handle_generate(
        &self,
        description: String,
        persona: Option<Persona>,
        model: Option<String>,
        auto_run: bool,
        sink: &EventSink,
    ) {
        let command = {
            let _turn = self.turn.lock().await;
            self.busy.store(true, Ordering::SeqCst);

            self.conversation
                .lock()
                .await
                .append(Message::new(Role::User, description.clone()));

            let model = model.unwrap_or_else(|| self.default_model.clone());
            let persona = persona.unwrap_or_else(|| self.persona.clone());
            let result = self
                .assistant
                .generate_command(&description, &model, &persona)
                .await;
            self.busy.store(false, Ordering::SeqCst);

            match result {
                Ok(command) => {
                    self.conversation
                        .lock()
                        .await
                        .append(Message::new(Role::Assistant, command.clone()));
                    sink.emit(ServerEvent::CommandGenerated {
                        success: true,
                        command: Some(command.clone()),
                        error: None,
                        auto_run,
                    });
                    command
                }
                Err(e) => {
                    let message = e.to_string();
                    self.conversation
                        .lock()
                        .await
                        .append(Message::error(message.clone()));
                    sink.emit(ServerEvent::CommandGenerated {
                        success: false,
                        command: None,
                        error: Some(message),
                        auto_run,
                    });
                    return;
                }
            }
        };

        // Without auto-run the command is staged for the browser to review.
        if !auto_run {
            return;
        }

        let result = {
            let mut shell = self.shell.lock().await;
            let Some(connection) = shell.connection.as_mut() else {
                sink.emit(ServerEvent::AiCommandResult {
                    success: false,
                    output: None,
                    error: Some("Not connected to SSH server".to_string()),
                    kind: ResultKind::Error,
                    history: None,
                });
                return;
            };
            connection.run(&command).await
        };

        let history = self.conversation.lock().await.snapshot();
        match result {
            Ok(output) => sink.emit(ServerEvent::AiCommandResult {
                success: true,
                output: Some(output.output),
                error: None,
                kind: ResultKind::Success,
                history: Some(history),
            }),
            Err(e) => sink.emit(ServerEvent::AiCommandResult {
                success: false,
                output: None,
                error: Some(e.to_string()),
                kind: ResultKind::Error,
                history: Some(history),
            }),
        }
    }
}
