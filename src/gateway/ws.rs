//! WebSocket transport for browser connections
//!
//! One socket per browser tab. A session is created on upgrade and destroyed
//! — SSH channel included — when the socket goes away. Outbound events flow
//! through a per-connection channel drained by a send task; inbound events
//! are dispatched to the session **one at a time**, which is the per-session
//! serialization guarantee the session core relies on.

use crate::session::{EventSink, ServerEvent, SessionManager};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared state for the websocket endpoint
#[derive(Clone)]
pub struct WsState {
    pub sessions: Arc<SessionManager>,
}

/// Create the websocket router
pub fn ws_router(state: WsState) -> Router {
    Router::new().route("/ws", get(ws_upgrade)).with_state(state)
}

/// WebSocket upgrade handler
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one browser connection until it closes
async fn handle_socket(socket: WebSocket, state: WsState) {
    let session = state.sessions.create_session().await;
    let session_id = session.id().to_string();
    tracing::info!(session_id = %session_id, "browser connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Per-connection outbound channel; events go only to this socket.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let sink = EventSink::new(tx);

    sink.emit(ServerEvent::Ready {
        session_id: session_id.clone(),
    });

    let send_session_id = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(
                        session_id = %send_session_id,
                        "failed to serialize event: {}",
                        e
                    );
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                tracing::debug!(session_id = %send_session_id, "websocket send failed");
                break;
            }
        }
    });

    // Inbound events are awaited to completion before the next frame is
    // read: handlers for the same session never run concurrently.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str(&text) {
                Ok(event) => session.handle_event(event, &sink).await,
                Err(e) => {
                    let preview = &text[..text.len().min(200)];
                    tracing::warn!(
                        session_id = %session_id,
                        "invalid client event: {} (raw: {})",
                        e,
                        preview
                    );
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Tear the session down — SSH channel closed — before this handler
    // returns and the listener can accept a replacement connection.
    state.sessions.destroy_session(&session_id).await;
    send_task.abort();

    tracing::info!(session_id = %session_id, "browser disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Persona, TermBridgeConfig};
    use crate::error::Result;
    use crate::history::Message as ChatMessage;
    use crate::settings::SettingsStore;
    use crate::ssh::{CommandOutput, ConnectionProfile, ShellConnection, ShellConnector};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct NullConnector;

    #[async_trait]
    impl ShellConnector for NullConnector {
        async fn connect(&self, _profile: &ConnectionProfile) -> Result<Box<dyn ShellConnection>> {
            Ok(Box::new(NullConnection))
        }
    }

    struct NullConnection;

    #[async_trait]
    impl ShellConnection for NullConnection {
        async fn run(&mut self, _command: &str) -> Result<CommandOutput> {
            Ok(CommandOutput {
                output: String::new(),
                exit_status: 0,
            })
        }

        async fn close(&mut self) {}
    }

    struct NullAssistant;

    #[async_trait]
    impl crate::assistant::AssistantBackend for NullAssistant {
        async fn complete(
            &self,
            _prompt: &str,
            _history: &[ChatMessage],
            _model: &str,
            _persona: &Persona,
        ) -> Result<String> {
            Ok("ok".to_string())
        }

        async fn generate_command(
            &self,
            _description: &str,
            _model: &str,
            _persona: &Persona,
        ) -> Result<String> {
            Ok("true".to_string())
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn probe(&self, _url: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_ws_router_builds() {
        let dir = TempDir::new().unwrap();
        let settings = Arc::new(
            SettingsStore::open(dir.path().join("settings.json"))
                .await
                .unwrap(),
        );
        let sessions = Arc::new(SessionManager::new(
            Arc::new(NullConnector),
            Arc::new(NullAssistant),
            settings,
            TermBridgeConfig::default(),
        ));
        let _router = ws_router(WsState { sessions });
    }
}
