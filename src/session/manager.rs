//! Session management
//!
//! Keyed store of live sessions. Sessions are created when a browser
//! connection opens and destroyed — SSH channel force-closed — when it goes
//! away. There is no global connection state: each session owns its own.

use crate::assistant::AssistantBackend;
use crate::config::TermBridgeConfig;
use crate::session::Session;
use crate::settings::SettingsStore;
use crate::ssh::ShellConnector;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Keyed store of per-connection sessions
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    connector: Arc<dyn ShellConnector>,
    assistant: Arc<dyn AssistantBackend>,
    settings: Arc<SettingsStore>,
    config: TermBridgeConfig,
}

impl SessionManager {
    /// Create a manager wiring sessions to the shared collaborators
    pub fn new(
        connector: Arc<dyn ShellConnector>,
        assistant: Arc<dyn AssistantBackend>,
        settings: Arc<SettingsStore>,
        config: TermBridgeConfig,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            connector,
            assistant,
            settings,
            config,
        }
    }

    /// Create a session for a new connection
    pub async fn create_session(&self) -> Arc<Session> {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(
            id.clone(),
            self.connector.clone(),
            self.assistant.clone(),
            self.settings.clone(),
            &self.config,
        ));

        self.sessions
            .write()
            .await
            .insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, "session created");
        session
    }

    /// Get a session by ID
    pub async fn get_session(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Destroy a session, force-closing its SSH channel.
    ///
    /// Runs the teardown before returning so the channel is gone by the time
    /// the transport accepts another connection.
    pub async fn destroy_session(&self, session_id: &str) {
        let session = self.sessions.write().await.remove(session_id);
        if let Some(session) = session {
            session.teardown().await;
            tracing::info!(session_id = %session_id, "session destroyed");
        }
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
