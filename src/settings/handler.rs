//! HTTP handlers for the settings and saved-host API
//!
//! Browser-initiated REST endpoints:
//! - GET    /api/settings       — load settings
//! - POST   /api/settings       — merge and save settings
//! - GET    /api/hosts          — list saved hosts
//! - POST   /api/hosts          — save (upsert) a host
//! - DELETE /api/hosts/:name    — delete a saved host
//! - GET    /api/models         — model list from the assistant backend
//! - POST   /api/assistant/probe — reachability probe of an assistant URL

use crate::assistant::AssistantBackend;
use crate::settings::store::SettingsUpdate;
use crate::settings::{SavedHost, SettingsStore};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for settings handlers
#[derive(Clone)]
pub struct SettingsState {
    pub store: Arc<SettingsStore>,
    pub assistant: Arc<dyn AssistantBackend>,
}

/// Create the settings router with all REST endpoints
pub fn settings_router(state: SettingsState) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings))
        .route("/api/settings", post(save_settings))
        .route("/api/hosts", get(list_hosts))
        .route("/api/hosts", post(save_host))
        .route("/api/hosts/:name", delete(delete_host))
        .route("/api/models", get(list_models))
        .route("/api/assistant/probe", post(probe_assistant))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/settings
async fn get_settings(State(state): State<SettingsState>) -> impl IntoResponse {
    let settings = state.store.get().await;
    Json(serde_json::json!({ "success": true, "settings": settings }))
}

/// POST /api/settings
async fn save_settings(
    State(state): State<SettingsState>,
    Json(update): Json<SettingsUpdate>,
) -> impl IntoResponse {
    match state.store.update(update).await {
        Ok(settings) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "settings": settings })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

/// GET /api/hosts
async fn list_hosts(State(state): State<SettingsState>) -> impl IntoResponse {
    let hosts = state.store.list_hosts().await;
    Json(serde_json::json!({ "success": true, "hosts": hosts }))
}

/// POST /api/hosts
async fn save_host(
    State(state): State<SettingsState>,
    Json(host): Json<SavedHost>,
) -> impl IntoResponse {
    if host.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false, "error": "host name is required" })),
        );
    }

    match state.store.upsert_host(host).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "message": "Host saved" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

/// DELETE /api/hosts/:name
async fn delete_host(
    State(state): State<SettingsState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_host(&name).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "message": "Host deleted" })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

/// GET /api/models
async fn list_models(State(state): State<SettingsState>) -> impl IntoResponse {
    match state.assistant.list_models().await {
        Ok(models) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "models": models })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

/// Probe request body
#[derive(Debug, Deserialize)]
struct ProbeRequest {
    url: String,
}

/// POST /api/assistant/probe
async fn probe_assistant(
    State(state): State<SettingsState>,
    Json(request): Json<ProbeRequest>,
) -> impl IntoResponse {
    let url = request.url.trim_end_matches('/');
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false, "error": "No URL provided" })),
        );
    }

    match state.assistant.probe(url).await {
        Ok(models) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": format!("Connected to assistant at {}", url),
                "models": models,
            })),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Connection failed: {}", e),
            })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Persona;
    use crate::error::{Error, Result};
    use crate::history::Message;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Assistant stub with a fixed model list
    struct StubAssistant {
        models: Vec<String>,
        reachable: bool,
    }

    #[async_trait]
    impl AssistantBackend for StubAssistant {
        async fn complete(
            &self,
            _prompt: &str,
            _history: &[Message],
            _model: &str,
            _persona: &Persona,
        ) -> Result<String> {
            unimplemented!("not exercised by settings tests")
        }

        async fn generate_command(
            &self,
            _description: &str,
            _model: &str,
            _persona: &Persona,
        ) -> Result<String> {
            unimplemented!("not exercised by settings tests")
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            if self.reachable {
                Ok(self.models.clone())
            } else {
                Err(Error::Network("connection refused".to_string()))
            }
        }

        async fn probe(&self, _url: &str) -> Result<Vec<String>> {
            self.list_models().await
        }
    }

    async fn make_state(dir: &TempDir, reachable: bool) -> SettingsState {
        let store = Arc::new(
            SettingsStore::open(dir.path().join("settings.json"))
                .await
                .unwrap(),
        );
        SettingsState {
            store,
            assistant: Arc::new(StubAssistant {
                models: vec!["llama2".to_string(), "mistral".to_string()],
                reachable,
            }),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_get_settings_empty() {
        let dir = TempDir::new().unwrap();
        let app = settings_router(make_state(&dir, true).await);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/settings")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert!(json["settings"]["hosts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_host_crud_round_trip() {
        let dir = TempDir::new().unwrap();
        let state = make_state(&dir, true).await;
        let app = settings_router(state.clone());

        let host = serde_json::json!({
            "name": "prod",
            "host": "example.com",
            "port": 22,
            "username": "deploy",
            "password": "pw"
        });
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/hosts")
                    .header("content-type", "application/json")
                    .body(Body::from(host.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/hosts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["hosts"][0]["name"], "prod");

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/hosts/prod")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.store.list_hosts().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_host_requires_name() {
        let dir = TempDir::new().unwrap();
        let app = settings_router(make_state(&dir, true).await);

        let host = serde_json::json!({
            "name": "  ",
            "host": "example.com",
            "port": 22,
            "username": "deploy"
        });
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/hosts")
                    .header("content-type", "application/json")
                    .body(Body::from(host.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_models() {
        let dir = TempDir::new().unwrap();
        let app = settings_router(make_state(&dir, true).await);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["models"][0], "llama2");
    }

    #[tokio::test]
    async fn test_probe_unreachable_backend() {
        let dir = TempDir::new().unwrap();
        let app = settings_router(make_state(&dir, false).await);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/assistant/probe")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"url":"http://localhost:11434"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("Connection failed"));
    }
}
